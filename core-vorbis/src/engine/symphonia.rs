//! # Symphonia Codec Engine
//!
//! Vorbis decoding backed by `symphonia-codec-vorbis`.
//!
//! Symphonia's Vorbis decoder is configured from codec "extra data" holding
//! the identification header followed by the setup header, the same layout
//! its Ogg demuxer produces. The comment header carries no decoding state and
//! is not passed on.

use super::sample_converter::SampleConverter;
use super::{CodecEngine, EngineError, EngineFactory, PcmBlock};
use crate::header::{IdentificationHeader, SetupHeader};
use crate::packet::PacketInfo;
use symphonia::core::codecs::{CodecParameters, Decoder, DecoderOptions, CODEC_TYPE_VORBIS};
use symphonia::core::formats::Packet;
use symphonia_codec_vorbis::VorbisDecoder;
use tracing::{debug, instrument, trace};

/// Creates [`SymphoniaEngine`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaEngineFactory;

impl SymphoniaEngineFactory {
    pub fn new() -> Self {
        Self
    }
}

impl EngineFactory for SymphoniaEngineFactory {
    #[instrument(skip_all, fields(
        channels = identification.channels(),
        sample_rate = identification.sample_rate()
    ))]
    fn create(
        &self,
        identification: &IdentificationHeader,
        setup: &SetupHeader,
    ) -> Result<Box<dyn CodecEngine>, EngineError> {
        let mut extra_data =
            Vec::with_capacity(identification.raw().len() + setup.raw().len());
        extra_data.extend_from_slice(identification.raw());
        extra_data.extend_from_slice(setup.raw());

        let mut params = CodecParameters::new();
        params
            .for_codec(CODEC_TYPE_VORBIS)
            .with_sample_rate(identification.sample_rate())
            .with_extra_data(extra_data.into_boxed_slice());

        let decoder = VorbisDecoder::try_new(&params, &DecoderOptions::default()).map_err(|e| {
            debug!("Symphonia rejected Vorbis setup: {}", e);
            EngineError::Rejected(e.to_string())
        })?;

        debug!("Symphonia Vorbis decoder created");

        Ok(Box::new(SymphoniaEngine {
            decoder,
            channels: usize::from(identification.channels()),
        }))
    }

    fn name(&self) -> &'static str {
        "symphonia"
    }
}

/// Codec engine wrapping Symphonia's Vorbis decoder.
pub struct SymphoniaEngine {
    decoder: VorbisDecoder,
    channels: usize,
}

impl CodecEngine for SymphoniaEngine {
    fn decode(
        &mut self,
        data: &[u8],
        info: &PacketInfo,
        block: &mut PcmBlock,
    ) -> Result<(), EngineError> {
        let ts = info.granule_position.get().unwrap_or(info.sequence);
        let packet = Packet::new_from_slice(0, ts, 0, data);

        let decoded = self
            .decoder
            .decode(&packet)
            .map_err(|e| EngineError::Corrupt(e.to_string()))?;

        let decoded_channels = decoded.spec().channels.count();
        if decoded_channels != self.channels {
            return Err(EngineError::Corrupt(format!(
                "decoded {} channels, stream has {}",
                decoded_channels, self.channels
            )));
        }

        let frames = SampleConverter::copy_planar_f32(&decoded, block);
        trace!(sequence = info.sequence, frames, "Symphonia decoded packet");

        Ok(())
    }
}

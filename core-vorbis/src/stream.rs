//! # Whole-Stream Decoding
//!
//! [`StreamDecoder`] drives a [`VorbisDecoder`] over demuxed packets: the
//! first three go through header negotiation, the engine is initialized, and
//! every later packet is decoded. PCM is concatenated per channel.
//!
//! Packets may be supplied in several batches; session state carries over
//! between calls. Recoverable packet failures are collected as
//! [`DecodeErrorRecord`]s instead of aborting the batch.

use crate::config::DecoderConfig;
use crate::decoder::{OutputSlots, VorbisDecoder};
use crate::engine::EngineFactory;
use crate::error::{DecoderError, Result};
use crate::packet::OggPacket;
use crate::session::Phase;
use serde::Serialize;
use tracing::{debug, instrument, warn};

/// A packet that failed to decode without ending the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeErrorRecord {
    pub message: String,
    /// Length of the failing packet in bytes.
    pub frame_length: usize,
    /// Zero-based index of the failing packet among audio packets.
    pub frame_number: u64,
    /// Audio bytes submitted to the session so far, including this packet.
    pub input_bytes: u64,
    /// Frames per channel produced by the session so far.
    pub output_samples: u64,
}

/// PCM decoded from one batch of packets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedAudio {
    /// One plane per channel.
    pub channel_data: Vec<Vec<f32>>,
    /// Frames per channel in `channel_data`.
    pub samples_decoded: usize,
    pub sample_rate: u32,
    pub errors: Vec<DecodeErrorRecord>,
}

impl DecodedAudio {
    pub fn channels(&self) -> usize {
        self.channel_data.len()
    }

    fn append(&mut self, out: &OutputSlots) {
        if self.channel_data.len() < out.channel_data.len() {
            self.channel_data.resize_with(out.channel_data.len(), Vec::new);
        }
        for (dst, src) in self.channel_data.iter_mut().zip(&out.channel_data) {
            dst.extend_from_slice(src);
        }
        self.samples_decoded += out.samples_decoded;
    }
}

/// Decodes sequences of Ogg packets through a single session.
#[derive(Debug)]
pub struct StreamDecoder {
    decoder: VorbisDecoder,
    out: OutputSlots,
}

impl StreamDecoder {
    /// Stream decoder backed by the Symphonia codec engine.
    #[cfg(feature = "engine-symphonia")]
    pub fn new(config: DecoderConfig) -> Result<Self> {
        Ok(Self::from_decoder(VorbisDecoder::new(config)?))
    }

    pub fn with_engine(config: DecoderConfig, factory: Box<dyn EngineFactory>) -> Result<Self> {
        Ok(Self::from_decoder(VorbisDecoder::with_engine(config, factory)?))
    }

    pub fn from_decoder(decoder: VorbisDecoder) -> Self {
        Self {
            decoder,
            out: OutputSlots::new(),
        }
    }

    pub fn decoder(&self) -> &VorbisDecoder {
        &self.decoder
    }

    /// Returns `true` once the end-of-stream packet has been decoded.
    pub fn is_complete(&self) -> bool {
        self.decoder.phase() == Phase::Complete
    }

    /// Decode a batch of packets.
    ///
    /// Packets after the end-of-stream packet are ignored. A batch that ends
    /// before the headers are complete returns empty audio.
    ///
    /// # Errors
    ///
    /// Any fatal session error aborts the batch.
    #[instrument(skip(self, packets), fields(packets = packets.len()))]
    pub fn decode(&mut self, packets: &[OggPacket]) -> Result<DecodedAudio> {
        let mut audio = DecodedAudio::default();

        for packet in packets {
            match self.decoder.phase() {
                Phase::Created | Phase::HeaderId | Phase::HeaderComment => {
                    self.decoder
                        .submit_header_packet(&packet.data, packet.page, &mut self.out)?;
                    if self.decoder.phase() == Phase::HeaderSetup {
                        self.decoder.init_dsp()?;
                    }
                    continue;
                }
                Phase::Complete => {
                    debug!("Ignoring packets after end of stream");
                    break;
                }
                _ => {}
            }

            match self
                .decoder
                .decode_packets(&packet.data, packet.page, &mut self.out)
            {
                Ok(_) => audio.append(&self.out),
                Err(e) if e.is_recoverable() => {
                    let stats = self.decoder.stats();
                    warn!(error = %e, "Skipping undecodable packet");
                    audio.errors.push(DecodeErrorRecord {
                        message: e.to_string(),
                        frame_length: packet.data.len(),
                        frame_number: stats.packets_submitted.saturating_sub(1),
                        input_bytes: stats.input_bytes,
                        output_samples: stats.samples_decoded,
                    });
                }
                Err(DecoderError::StreamComplete) => break,
                Err(e) => return Err(e),
            }
        }

        audio.sample_rate = self.out.sample_rate;
        if audio.channel_data.is_empty() {
            audio.channel_data = vec![Vec::new(); self.out.channels as usize];
        }

        debug!(
            samples = audio.samples_decoded,
            errors = audio.errors.len(),
            "Batch decoded"
        );
        Ok(audio)
    }

    /// Destroy the underlying session.
    pub fn finish(mut self) -> Result<()> {
        self.decoder.destroy()
    }
}

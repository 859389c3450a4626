//! # Decoder Adapter
//!
//! [`VorbisDecoder`] owns one decode session and drives it through header
//! negotiation, engine initialization and per-packet decoding.
//!
//! Packet bytes and output slots are borrowed per call and never retained:
//!
//! ```rust,ignore
//! let mut out = OutputSlots::new();
//! let mut decoder = VorbisDecoder::new(DecoderConfig::default())?;
//!
//! decoder.submit_header_packet(&ident, PageInfo::first(), &mut out)?;
//! decoder.submit_header_packet(&comment, PageInfo::continuation(), &mut out)?;
//! decoder.submit_header_packet(&setup, PageInfo::continuation(), &mut out)?;
//! decoder.init_dsp()?;
//!
//! for packet in audio {
//!     match decoder.decode_packets(&packet.data, packet.page, &mut out) {
//!         Ok(frames) => consume(&out.channel_data, frames),
//!         Err(e) if e.is_recoverable() => continue,
//!         Err(e) => return Err(e),
//!     }
//! }
//! decoder.destroy()?;
//! ```

use crate::config::DecoderConfig;
use crate::engine::{CodecEngine, EngineError, EngineFactory, PcmBlock};
use crate::error::{DecoderError, ErrorKind, Result};
use crate::header::{HeaderKind, IdentificationHeader, SetupHeader, StreamParams, VorbisComment};
use crate::packet::{PacketInfo, PageInfo};
use crate::session::{Phase, SessionStats};
use core_runtime::logging::summarize_bytes;
use tracing::{debug, error, info, instrument, trace, warn};

/// Caller-owned output slots written by the decoder.
///
/// `channel_data` is overwritten, never appended to, by each successful
/// decode; its contents are valid until the next decode call. Nothing is
/// written on failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputSlots {
    /// One plane of `f32` samples per channel.
    pub channel_data: Vec<Vec<f32>>,
    /// Channel count, written when the identification header is consumed.
    pub channels: u32,
    /// Sample rate in Hz, written when the identification header is consumed.
    pub sample_rate: u32,
    /// Frames per channel produced by the last successful decode.
    pub samples_decoded: usize,
}

impl OutputSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples of one channel from the last successful decode.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channel_data.get(index).map(Vec::as_slice)
    }

    fn write_stream_params(&mut self, params: StreamParams) {
        self.channels = u32::from(params.channels);
        self.sample_rate = params.sample_rate;
    }

    fn write_block(&mut self, block: &PcmBlock) {
        let planes = block.planes();
        self.channel_data.resize_with(planes.len(), Vec::new);
        for (dst, src) in self.channel_data.iter_mut().zip(planes) {
            dst.clear();
            dst.extend_from_slice(src);
        }
        self.samples_decoded = block.frames();
    }
}

/// Stateful Ogg Vorbis decode session.
pub struct VorbisDecoder {
    config: DecoderConfig,
    factory: Box<dyn EngineFactory>,
    engine: Option<Box<dyn CodecEngine>>,
    phase: Phase,
    identification: Option<IdentificationHeader>,
    comment: Option<VorbisComment>,
    setup: Option<SetupHeader>,
    block: PcmBlock,
    next_sequence: u64,
    stats: SessionStats,
}

impl std::fmt::Debug for VorbisDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VorbisDecoder")
            .field("engine", &self.factory.name())
            .field("phase", &self.phase)
            .field("stream_params", &self.stream_params())
            .field("stats", &self.stats)
            .finish()
    }
}

impl VorbisDecoder {
    /// Create a session backed by the Symphonia codec engine.
    #[cfg(feature = "engine-symphonia")]
    pub fn new(config: DecoderConfig) -> Result<Self> {
        Self::with_engine(config, Box::new(crate::engine::SymphoniaEngineFactory::new()))
    }

    /// Create a session backed by a custom codec engine.
    pub fn with_engine(config: DecoderConfig, factory: Box<dyn EngineFactory>) -> Result<Self> {
        config.validate()?;
        debug!(engine = factory.name(), "Creating decode session");

        Ok(Self {
            config,
            factory,
            engine: None,
            phase: Phase::Created,
            identification: None,
            comment: None,
            setup: None,
            block: PcmBlock::new(),
            next_sequence: 0,
            stats: SessionStats::default(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Channel count and sample rate, once the identification header is read.
    pub fn stream_params(&self) -> Option<StreamParams> {
        self.identification
            .as_ref()
            .map(IdentificationHeader::stream_params)
    }

    pub fn identification(&self) -> Option<&IdentificationHeader> {
        self.identification.as_ref()
    }

    pub fn comment(&self) -> Option<&VorbisComment> {
        self.comment.as_ref()
    }

    pub fn engine_name(&self) -> &'static str {
        self.factory.name()
    }

    /// Consume the next header packet.
    ///
    /// Headers must arrive as identification, comment, setup. On the
    /// identification header the channel count and sample rate are written to
    /// `out` immediately.
    ///
    /// # Errors
    ///
    /// - `MalformedHeader` if the packet is not a valid Vorbis header
    /// - `SequenceViolation` if the header arrives out of order, after all
    ///   three were consumed, with page flags contradicting its position, or
    ///   as a second identification header
    ///
    /// Both are fatal to the session.
    #[instrument(skip(self, packet, out), fields(len = packet.len(), phase = %self.phase))]
    pub fn submit_header_packet(
        &mut self,
        packet: &[u8],
        page: PageInfo,
        out: &mut OutputSlots,
    ) -> Result<HeaderKind> {
        self.ensure_alive()?;
        if let Phase::Faulted(kind) = self.phase {
            return Err(faulted_error(kind));
        }

        let info = self.packet_info(packet, page);
        trace!(
            sequence = info.sequence,
            bytes = %summarize_bytes(packet, 8),
            "Header packet"
        );

        match self.consume_header(packet, &info, out) {
            Ok(kind) => {
                self.phase = Phase::after_header(kind);
                debug!(header = %kind, phase = %self.phase, "Header consumed");
                Ok(kind)
            }
            Err(e) => Err(self.fault(e)),
        }
    }

    fn consume_header(
        &mut self,
        packet: &[u8],
        info: &PacketInfo,
        out: &mut OutputSlots,
    ) -> Result<HeaderKind> {
        let Some(expected) = self.phase.expected_header() else {
            return Err(DecoderError::SequenceViolation(format!(
                "header packet submitted after all three headers were consumed (phase: {})",
                self.phase
            )));
        };

        if packet.len() > self.config.max_header_bytes {
            return Err(DecoderError::MalformedHeader(format!(
                "header packet of {} bytes exceeds limit of {}",
                packet.len(),
                self.config.max_header_bytes
            )));
        }

        let Some(kind) = HeaderKind::classify(packet) else {
            return Err(DecoderError::MalformedHeader(match packet.first() {
                Some(packet_type) => {
                    format!("packet type 0x{:02x} is not a Vorbis header", packet_type)
                }
                None => "empty header packet".to_string(),
            }));
        };

        if kind != expected {
            return Err(self.unexpected_header(kind, expected, packet));
        }

        self.check_header_page_flags(kind, info)?;

        match kind {
            HeaderKind::Identification => {
                let identification = IdentificationHeader::parse(packet)?;
                let params = identification.stream_params();
                out.write_stream_params(params);
                info!(
                    channels = params.channels,
                    sample_rate = params.sample_rate,
                    "Stream parameters locked"
                );
                self.identification = Some(identification);
            }
            HeaderKind::Comment => {
                let comment = VorbisComment::parse(packet, self.config.max_comment_entries)?;
                debug!(vendor = %comment.vendor, entries = comment.len(), "Comment header parsed");
                self.comment = Some(comment);
            }
            HeaderKind::Setup => {
                let setup = SetupHeader::parse(packet)?;
                debug!(codebooks = setup.codebook_count(), "Setup header parsed");
                self.setup = Some(setup);
            }
        }

        Ok(kind)
    }

    fn unexpected_header(
        &self,
        kind: HeaderKind,
        expected: HeaderKind,
        packet: &[u8],
    ) -> DecoderError {
        if kind == HeaderKind::Identification {
            if let Some(current) = self.stream_params() {
                let changed = IdentificationHeader::parse(packet)
                    .map(|repeat| repeat.stream_params() != current)
                    .unwrap_or(false);
                if changed {
                    return DecoderError::SequenceViolation(
                        "stream parameters changed by a second identification header"
                            .to_string(),
                    );
                }
                return DecoderError::SequenceViolation(
                    "identification header submitted twice".to_string(),
                );
            }
        }

        DecoderError::SequenceViolation(format!(
            "expected {} header, got {} header",
            expected, kind
        ))
    }

    fn check_header_page_flags(&self, kind: HeaderKind, info: &PacketInfo) -> Result<()> {
        if !self.config.strict_page_flags {
            return Ok(());
        }

        let is_first = kind == HeaderKind::Identification;
        if is_first && !info.first_page {
            return Err(DecoderError::SequenceViolation(
                "identification header must be the first packet of the first page".to_string(),
            ));
        }
        if !is_first && info.first_page {
            return Err(DecoderError::SequenceViolation(format!(
                "{} header flagged as begin-of-stream",
                kind
            )));
        }
        if info.last_page {
            return Err(DecoderError::SequenceViolation(format!(
                "{} header flagged as end-of-stream",
                kind
            )));
        }

        Ok(())
    }

    /// Build the codec engine from the consumed headers.
    ///
    /// After an `EngineInitFailed` the call may be repeated; it re-attempts
    /// with the same headers.
    ///
    /// # Errors
    ///
    /// - `NotReady` if fewer than three headers were consumed
    /// - `EngineInitFailed` if the engine rejects the stream configuration
    /// - `SequenceViolation` if the engine already exists or the session
    ///   faulted for another reason
    #[instrument(skip(self), fields(phase = %self.phase))]
    pub fn init_dsp(&mut self) -> Result<()> {
        self.ensure_alive()?;

        match self.phase {
            Phase::HeaderSetup | Phase::Faulted(ErrorKind::EngineInitFailed) => {}
            phase if phase.is_initialized() => {
                return Err(self.fault(DecoderError::SequenceViolation(
                    "codec engine already initialized".to_string(),
                )));
            }
            Phase::Faulted(kind) if self.setup.is_some() => {
                return Err(faulted_error(kind));
            }
            _ => {
                return Err(self.fault(DecoderError::NotReady(format!(
                    "{} of 3 header packets consumed",
                    self.headers_present()
                ))));
            }
        }

        let created = match (&self.identification, &self.setup) {
            (Some(identification), Some(setup)) => self.factory.create(identification, setup),
            _ => Err(EngineError::Rejected("header state incomplete".to_string())),
        };

        match created {
            Ok(engine) => {
                self.engine = Some(engine);
                self.phase = Phase::Initialized;
                info!(engine = self.factory.name(), "Codec engine initialized");
                Ok(())
            }
            Err(e) => Err(self.fault(DecoderError::EngineInitFailed(e.to_string()))),
        }
    }

    /// Decode one audio packet into `out`.
    ///
    /// Returns the number of frames per channel written. A packet may decode
    /// to zero frames. When `page.last_page` is set and the decode succeeds,
    /// the session completes and further calls return `StreamComplete`.
    ///
    /// # Errors
    ///
    /// - `DecodeError` if the packet is empty, is a header, or the engine
    ///   cannot decode it; `out` is untouched and the session stays usable
    /// - `SequenceViolation` if the engine is not initialized, the granule
    ///   position moved backwards, or a data packet claims begin-of-stream
    /// - `StreamComplete` after the end-of-stream packet was decoded
    #[instrument(skip(self, packet, out), fields(len = packet.len(), phase = %self.phase))]
    pub fn decode_packets(
        &mut self,
        packet: &[u8],
        page: PageInfo,
        out: &mut OutputSlots,
    ) -> Result<usize> {
        self.ensure_alive()?;

        match self.phase {
            Phase::Initialized | Phase::Decoding => {}
            Phase::Complete => return Err(DecoderError::StreamComplete),
            Phase::Faulted(kind) => return Err(faulted_error(kind)),
            phase => {
                return Err(self.fault(DecoderError::SequenceViolation(format!(
                    "decode requested before initialization (phase: {})",
                    phase
                ))));
            }
        }

        let info = self.packet_info(packet, page);
        self.stats.packets_submitted += 1;
        self.stats.input_bytes += packet.len() as u64;
        trace!(
            sequence = info.sequence,
            granule = %info.granule_position,
            bytes = %summarize_bytes(packet, 8),
            "Audio packet"
        );

        if self.config.strict_page_flags && info.first_page {
            return Err(self.fault(DecoderError::SequenceViolation(
                "audio packet flagged as begin-of-stream".to_string(),
            )));
        }

        if let (Some(granule), Some(last)) =
            (info.granule_position.get(), self.stats.last_granule)
        {
            if granule < last {
                return Err(self.fault(DecoderError::SequenceViolation(format!(
                    "granule position moved backwards from {} to {}",
                    last, granule
                ))));
            }
        }

        let frames = match self.decode_block(packet, &info) {
            Ok(frames) => frames,
            Err(e) => {
                self.stats.packets_failed += 1;
                warn!(sequence = info.sequence, error = %e, "Packet decode failed");
                return Err(e);
            }
        };

        out.write_block(&self.block);
        if let Some(params) = self.stream_params() {
            out.write_stream_params(params);
        }

        if let Some(granule) = info.granule_position.get() {
            self.stats.last_granule = Some(granule);
        }
        self.stats.packets_decoded += 1;
        self.stats.samples_decoded += frames as u64;

        self.phase = if info.last_page {
            debug!(sequence = info.sequence, "End-of-stream packet decoded");
            Phase::Complete
        } else {
            Phase::Decoding
        };

        Ok(frames)
    }

    fn decode_block(&mut self, packet: &[u8], info: &PacketInfo) -> Result<usize> {
        let Some(&first) = packet.first() else {
            return Err(DecoderError::DecodeError("empty audio packet".to_string()));
        };
        if first & 0x01 != 0 {
            return Err(DecoderError::DecodeError(format!(
                "header packet (type 0x{:02x}) in audio position",
                first
            )));
        }

        let channels = self
            .stream_params()
            .map_or(0, |params| usize::from(params.channels));
        self.block.prepare(channels);

        let engine = match self.engine.as_mut() {
            Some(engine) => engine,
            None => {
                return Err(DecoderError::SequenceViolation(
                    "codec engine missing".to_string(),
                ))
            }
        };
        engine
            .decode(packet, info, &mut self.block)
            .map_err(|e| DecoderError::DecodeError(e.to_string()))?;

        if self.block.channel_count() != channels {
            return Err(DecoderError::DecodeError(format!(
                "engine produced {} channels, stream has {}",
                self.block.channel_count(),
                channels
            )));
        }
        if !self.block.is_rectangular() {
            return Err(DecoderError::DecodeError(
                "engine produced channels of unequal length".to_string(),
            ));
        }

        Ok(self.block.frames())
    }

    /// Release the codec engine and all session state.
    ///
    /// Caller-owned output slots are not touched. Every later call, including
    /// a second `destroy`, fails with `UseAfterDestroy`.
    #[instrument(skip(self), fields(phase = %self.phase))]
    pub fn destroy(&mut self) -> Result<()> {
        self.ensure_alive()?;

        self.engine = None;
        self.identification = None;
        self.comment = None;
        self.setup = None;
        self.block = PcmBlock::new();
        self.phase = Phase::Destroyed;

        debug!(
            packets_decoded = self.stats.packets_decoded,
            samples_decoded = self.stats.samples_decoded,
            "Decode session destroyed"
        );
        Ok(())
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.phase == Phase::Destroyed {
            return Err(DecoderError::UseAfterDestroy);
        }
        Ok(())
    }

    fn packet_info(&mut self, packet: &[u8], page: PageInfo) -> PacketInfo {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        PacketInfo {
            sequence,
            len: packet.len(),
            first_page: page.first_page,
            last_page: page.last_page,
            granule_position: page.granule_position,
        }
    }

    fn headers_present(&self) -> usize {
        [
            self.identification.is_some(),
            self.comment.is_some(),
            self.setup.is_some(),
        ]
        .iter()
        .filter(|&&present| present)
        .count()
    }

    /// Record a fatal error. The first fault sticks.
    fn fault(&mut self, err: DecoderError) -> DecoderError {
        if err.is_fatal() && !matches!(self.phase, Phase::Faulted(_)) {
            error!(error = %err, phase = %self.phase, "Decode session faulted");
            self.phase = Phase::Faulted(err.kind());
        }
        err
    }
}

fn faulted_error(kind: ErrorKind) -> DecoderError {
    DecoderError::SequenceViolation(format!("session faulted by earlier {}", kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SilenceFactory;

    struct SilenceEngine;

    impl EngineFactory for SilenceFactory {
        fn create(
            &self,
            _identification: &IdentificationHeader,
            _setup: &SetupHeader,
        ) -> std::result::Result<Box<dyn CodecEngine>, EngineError> {
            Ok(Box::new(SilenceEngine))
        }
    }

    impl CodecEngine for SilenceEngine {
        fn decode(
            &mut self,
            data: &[u8],
            _info: &PacketInfo,
            block: &mut PcmBlock,
        ) -> std::result::Result<(), EngineError> {
            for channel in 0..block.channel_count() {
                if let Some(plane) = block.plane_mut(channel) {
                    plane.resize(data.len(), 0.0);
                }
            }
            Ok(())
        }
    }

    fn ident() -> Vec<u8> {
        let mut packet = b"\x01vorbis".to_vec();
        packet.extend_from_slice(&0u32.to_le_bytes());
        packet.push(1);
        packet.extend_from_slice(&8_000u32.to_le_bytes());
        packet.extend_from_slice(&[0u8; 12]);
        packet.push(0x88);
        packet.push(0x01);
        packet
    }

    fn comment() -> Vec<u8> {
        let mut packet = b"\x03vorbis".to_vec();
        packet.extend_from_slice(&0u32.to_le_bytes());
        packet.extend_from_slice(&0u32.to_le_bytes());
        packet.push(0x01);
        packet
    }

    fn setup() -> Vec<u8> {
        b"\x05vorbis\x00BCV\x01".to_vec()
    }

    fn ready_decoder(out: &mut OutputSlots) -> VorbisDecoder {
        let mut decoder =
            VorbisDecoder::with_engine(DecoderConfig::default(), Box::new(SilenceFactory))
                .unwrap();
        decoder
            .submit_header_packet(&ident(), PageInfo::first(), out)
            .unwrap();
        decoder
            .submit_header_packet(&comment(), PageInfo::continuation(), out)
            .unwrap();
        decoder
            .submit_header_packet(&setup(), PageInfo::continuation(), out)
            .unwrap();
        decoder.init_dsp().unwrap();
        decoder
    }

    #[test]
    fn test_sequence_numbers_increase() {
        let mut out = OutputSlots::new();
        let mut decoder = ready_decoder(&mut out);
        assert_eq!(decoder.next_sequence, 3);

        decoder
            .decode_packets(&[0x00, 0x10], PageInfo::continuation(), &mut out)
            .unwrap();
        decoder
            .decode_packets(&[], PageInfo::continuation(), &mut out)
            .unwrap_err();
        assert_eq!(decoder.next_sequence, 5);
    }

    #[test]
    fn test_output_is_overwritten() {
        let mut out = OutputSlots::new();
        let mut decoder = ready_decoder(&mut out);

        decoder
            .decode_packets(&[0x00; 6], PageInfo::continuation(), &mut out)
            .unwrap();
        assert_eq!(out.channel(0).map(<[f32]>::len), Some(6));

        decoder
            .decode_packets(&[0x00; 2], PageInfo::continuation(), &mut out)
            .unwrap();
        assert_eq!(out.channel(0).map(<[f32]>::len), Some(2));
        assert_eq!(out.samples_decoded, 2);
    }

    #[test]
    fn test_first_fault_sticks() {
        let mut out = OutputSlots::new();
        let mut decoder =
            VorbisDecoder::with_engine(DecoderConfig::default(), Box::new(SilenceFactory))
                .unwrap();

        let err = decoder
            .submit_header_packet(&setup(), PageInfo::first(), &mut out)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SequenceViolation);

        let err = decoder.init_dsp().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotReady);
        assert_eq!(
            decoder.phase(),
            Phase::Faulted(ErrorKind::SequenceViolation)
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DecoderConfig {
            max_error_text_bytes: 0,
            ..Default::default()
        };
        let err = VorbisDecoder::with_engine(config, Box::new(SilenceFactory)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }
}

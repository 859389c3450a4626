//! Shared fixtures for core-vorbis integration tests
//!
//! - Packet builders for the three Vorbis headers and audio packets
//! - A deterministic fake codec engine whose output is derived from packet bytes
//! - A reader for the recorded Vorbis streams under `tests/fixtures`

#![allow(dead_code)]

use bytes::Buf;
use core_vorbis::{
    CodecEngine, DecoderConfig, EngineError, EngineFactory, IdentificationHeader, OggPacket,
    OutputSlots, PacketInfo, PageInfo, PcmBlock, SetupHeader, VorbisDecoder,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// First byte of an audio packet the fake engine refuses to decode.
pub const CORRUPT_MARKER: u8 = 0xfe;

// ============================================================================
// Packet Builders
// ============================================================================

pub fn ident_packet(channels: u8, sample_rate: u32) -> Vec<u8> {
    let mut packet = b"\x01vorbis".to_vec();
    packet.extend_from_slice(&0u32.to_le_bytes());
    packet.push(channels);
    packet.extend_from_slice(&sample_rate.to_le_bytes());
    packet.extend_from_slice(&0i32.to_le_bytes());
    packet.extend_from_slice(&160_000i32.to_le_bytes());
    packet.extend_from_slice(&0i32.to_le_bytes());
    packet.push(0xb8);
    packet.push(0x01);
    packet
}

pub fn comment_packet(vendor: &str, entries: &[&str]) -> Vec<u8> {
    let mut packet = b"\x03vorbis".to_vec();
    packet.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    packet.extend_from_slice(vendor.as_bytes());
    packet.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    for entry in entries {
        packet.extend_from_slice(&(entry.len() as u32).to_le_bytes());
        packet.extend_from_slice(entry.as_bytes());
    }
    packet.push(0x01);
    packet
}

pub fn setup_packet() -> Vec<u8> {
    b"\x05vorbis\x01BCV\x01\x00\x02\x00\x00\x80".to_vec()
}

/// Audio packet with an even first byte, as real Vorbis audio packets have.
pub fn audio_packet(seed: u8, len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| seed.wrapping_add((i as u8).wrapping_mul(37)))
        .enumerate()
        .map(|(i, b)| match i {
            0 if b & 0xfe == CORRUPT_MARKER => 0x00,
            0 => b & 0xfe,
            _ => b,
        })
        .collect()
}

pub fn corrupt_packet() -> Vec<u8> {
    vec![CORRUPT_MARKER, 0x12, 0x34]
}

/// Headers plus `audio` packets of a stream, with the last packet flagged as
/// end-of-stream and granule positions increasing by 64.
pub fn stream_packets(channels: u8, sample_rate: u32, audio: usize) -> Vec<OggPacket> {
    let mut packets = vec![
        OggPacket::new(ident_packet(channels, sample_rate), PageInfo::first()),
        OggPacket::new(
            comment_packet("fake encoder", &["TITLE=Test Tone", "ARTIST=Nobody"]),
            PageInfo::continuation(),
        ),
        OggPacket::new(setup_packet(), PageInfo::new(false, false, 0)),
    ];

    for i in 0..audio {
        let last = i + 1 == audio;
        let granule = ((i + 1) * 64) as i64;
        packets.push(OggPacket::new(
            audio_packet((i as u8).wrapping_mul(11), 16 + i),
            PageInfo::new(false, last, granule),
        ));
    }
    packets
}

// ============================================================================
// Recorded Streams
// ============================================================================

/// Decode a `.packets` fixture: demuxed Vorbis packets, each stored as
/// `u32` LE length, flags byte (bit 0 begin-of-stream, bit 1 end-of-stream),
/// `i64` LE granule position, then the packet bytes.
pub fn recorded_packets(mut bytes: &[u8]) -> Vec<OggPacket> {
    let mut packets = Vec::new();
    while bytes.has_remaining() {
        let len = bytes.get_u32_le() as usize;
        let flags = bytes.get_u8();
        let granule = bytes.get_i64_le();
        let data = bytes.copy_to_bytes(len);
        packets.push(OggPacket::new(
            data,
            PageInfo::new(flags & 0x01 != 0, flags & 0x02 != 0, granule),
        ));
    }
    packets
}

// ============================================================================
// Fake Codec Engine
// ============================================================================

/// Deterministic engine: two frames per packet byte, sample values derived
/// from the bytes and the channel index.
pub struct FakeEngine {
    channels: usize,
}

impl CodecEngine for FakeEngine {
    fn decode(
        &mut self,
        data: &[u8],
        _info: &PacketInfo,
        block: &mut PcmBlock,
    ) -> Result<(), EngineError> {
        if data.first() == Some(&CORRUPT_MARKER) {
            return Err(EngineError::Corrupt("fake engine: corrupt marker".to_string()));
        }

        for channel in 0..self.channels {
            let Some(plane) = block.plane_mut(channel) else {
                return Err(EngineError::Corrupt("fake engine: missing plane".to_string()));
            };
            for i in 0..data.len() * 2 {
                let byte = data[(i + channel) % data.len()];
                plane.push((f32::from(byte) - 128.0) / 128.0);
            }
        }
        Ok(())
    }
}

/// Factory for [`FakeEngine`], optionally refusing every stream.
#[derive(Clone, Default)]
pub struct FakeEngineFactory {
    pub fail_init: bool,
    pub created: Arc<AtomicUsize>,
}

impl FakeEngineFactory {
    pub fn failing() -> Self {
        Self {
            fail_init: true,
            ..Default::default()
        }
    }

    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl EngineFactory for FakeEngineFactory {
    fn create(
        &self,
        identification: &IdentificationHeader,
        _setup: &SetupHeader,
    ) -> Result<Box<dyn CodecEngine>, EngineError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            return Err(EngineError::Rejected(
                "fake engine: unsupported codebook geometry".to_string(),
            ));
        }
        Ok(Box::new(FakeEngine {
            channels: usize::from(identification.channels()),
        }))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

// ============================================================================
// Session Helpers
// ============================================================================

pub fn fake_decoder() -> VorbisDecoder {
    VorbisDecoder::with_engine(DecoderConfig::default(), Box::new(FakeEngineFactory::default()))
        .unwrap()
}

/// Decoder with all headers of a `channels`/`sample_rate` stream consumed and
/// the engine initialized.
pub fn ready_decoder(channels: u8, sample_rate: u32, out: &mut OutputSlots) -> VorbisDecoder {
    let mut decoder = fake_decoder();
    submit_headers(&mut decoder, channels, sample_rate, out);
    decoder.init_dsp().unwrap();
    decoder
}

pub fn submit_headers(
    decoder: &mut VorbisDecoder,
    channels: u8,
    sample_rate: u32,
    out: &mut OutputSlots,
) {
    decoder
        .submit_header_packet(&ident_packet(channels, sample_rate), PageInfo::first(), out)
        .unwrap();
    decoder
        .submit_header_packet(
            &comment_packet("fake encoder", &["TITLE=Test Tone"]),
            PageInfo::continuation(),
            out,
        )
        .unwrap();
    decoder
        .submit_header_packet(&setup_packet(), PageInfo::continuation(), out)
        .unwrap();
}

//! # Ogg Vorbis Decode Session
//!
//! Decodes Vorbis packets, already split out of their Ogg pages by an
//! external demuxer, into planar `f32` PCM.
//!
//! ## Overview
//!
//! This module handles:
//! - Header negotiation (identification, comment, setup) with strict ordering
//! - Codec engine initialization behind a pluggable [`EngineFactory`]
//! - Per-packet decoding into caller-owned [`OutputSlots`]
//! - Whole-stream decoding with recoverable error collection ([`StreamDecoder`])
//! - C ABI (`ffi` feature) and wasm-bindgen (`wasm` feature) boundaries
//!
//! ## Features
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `engine-symphonia` | yes | Symphonia-backed engine used by `VorbisDecoder::new` |
//! | `ffi` | no | `create_decoder`/`send_setup`/`init_dsp`/`decode_packets`/`destroy_decoder` |
//! | `wasm` | no | `OggVorbisDecoder` JavaScript class (`wasm32` only) |

pub mod config;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod header;
pub mod packet;
pub mod session;
pub mod stream;

#[cfg(feature = "ffi")]
pub mod ffi;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
pub mod wasm;

pub use config::DecoderConfig;
pub use decoder::{OutputSlots, VorbisDecoder};
pub use engine::{CodecEngine, EngineError, EngineFactory, PcmBlock};
pub use error::{DecoderError, ErrorKind, Result};
pub use header::{HeaderKind, IdentificationHeader, SetupHeader, StreamParams, VorbisComment};
pub use packet::{GranulePosition, OggPacket, PacketInfo, PageInfo};
pub use session::{Phase, SessionStats};
pub use stream::{DecodeErrorRecord, DecodedAudio, StreamDecoder};

#[cfg(feature = "engine-symphonia")]
pub use engine::{SymphoniaEngine, SymphoniaEngineFactory};

//! Workspace facade crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-vorbis`, `core-runtime`). Host applications can
//! depend on `vorbis-workspace` and enable `ffi`, `wasm` or `engine-symphonia`
//! without wiring each crate individually.

pub use core_runtime as runtime;
pub use core_vorbis as vorbis;

pub use core_vorbis::{
    DecodedAudio, DecoderConfig, DecoderError, OggPacket, OutputSlots, PageInfo, Result,
    StreamDecoder, VorbisDecoder,
};

//! # Codec Engine Seam
//!
//! The session never touches Vorbis bitstream internals itself. Audio packets
//! are handed to a [`CodecEngine`] built by an [`EngineFactory`] from the
//! parsed identification and setup headers.
//!
//! ## Engines
//!
//! | Engine | Feature | Notes |
//! |--------|---------|-------|
//! | [`SymphoniaEngineFactory`] | `engine-symphonia` | pure-Rust, works on `wasm32` |
//! | custom | - | any [`EngineFactory`] passed to `VorbisDecoder::with_engine` |
//!
//! Engines write planar `f32` PCM into a caller-provided [`PcmBlock`], which
//! the session validates before copying it to the output slots.

#[cfg(feature = "engine-symphonia")]
mod sample_converter;

#[cfg(feature = "engine-symphonia")]
mod symphonia;

#[cfg(feature = "engine-symphonia")]
pub use self::symphonia::{SymphoniaEngine, SymphoniaEngineFactory};

use crate::header::{IdentificationHeader, SetupHeader};
use crate::packet::PacketInfo;
use thiserror::Error;

/// Failure reported by a codec engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine refused the stream configuration.
    #[error("engine rejected stream configuration: {0}")]
    Rejected(String),

    /// A packet could not be decoded.
    #[error("corrupt packet: {0}")]
    Corrupt(String),
}

/// Planar PCM produced by one decode step, one plane per channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PcmBlock {
    planes: Vec<Vec<f32>>,
}

impl PcmBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to `channels` empty planes, keeping allocations.
    pub fn prepare(&mut self, channels: usize) {
        self.planes.resize_with(channels, Vec::new);
        for plane in &mut self.planes {
            plane.clear();
        }
    }

    pub fn plane_mut(&mut self, channel: usize) -> Option<&mut Vec<f32>> {
        self.planes.get_mut(channel)
    }

    pub fn planes(&self) -> &[Vec<f32>] {
        &self.planes
    }

    pub fn channel_count(&self) -> usize {
        self.planes.len()
    }

    /// Frames in the block, taken from the first plane.
    pub fn frames(&self) -> usize {
        self.planes.first().map_or(0, Vec::len)
    }

    /// Returns `true` if every plane holds the same number of frames.
    pub fn is_rectangular(&self) -> bool {
        let frames = self.frames();
        self.planes.iter().all(|plane| plane.len() == frames)
    }
}

/// A configured decoder for one logical stream.
pub trait CodecEngine: Send {
    /// Decode one audio packet into `block`.
    ///
    /// `block` arrives prepared with one empty plane per stream channel. A
    /// packet may legitimately produce zero frames (the first audio packet
    /// only primes the overlap window).
    fn decode(
        &mut self,
        data: &[u8],
        info: &PacketInfo,
        block: &mut PcmBlock,
    ) -> std::result::Result<(), EngineError>;
}

/// Builds codec engines once all three headers are known.
pub trait EngineFactory: Send + Sync {
    fn create(
        &self,
        identification: &IdentificationHeader,
        setup: &SetupHeader,
    ) -> std::result::Result<Box<dyn CodecEngine>, EngineError>;

    /// Engine name for diagnostics.
    fn name(&self) -> &'static str {
        "custom"
    }
}

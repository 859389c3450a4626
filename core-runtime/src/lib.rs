//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the Vorbis decoder workspace:
//! - Logging and tracing infrastructure
//! - Host log forwarding through `LoggerSink`
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the decoder crates depend on. It
//! establishes the logging conventions used throughout the workspace so that a
//! host (native binary, C caller or browser) can observe decoder activity.

pub mod error;
pub mod logging;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use error::{Error, Result};

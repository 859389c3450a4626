//! # Decoder Error Types
//!
//! Error taxonomy for the decode session. Every failure is reported as a value;
//! the boundary layers (`ffi`, `wasm`) translate it into an error code plus text.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors that can occur while driving a decode session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecoderError {
    // ========================================================================
    // Header Negotiation Errors
    // ========================================================================
    /// A header packet could not be parsed. Fatal to the session.
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// An operation was invoked out of the required order, or the granule
    /// position moved backwards. Fatal to the session.
    #[error("Sequence violation: {0}")]
    SequenceViolation(String),

    /// Initialization was attempted before all header packets were consumed.
    #[error("Decoder not ready: {0}")]
    NotReady(String),

    /// The codec engine rejected the stream configuration.
    #[error("Codec engine initialization failed: {0}")]
    EngineInitFailed(String),

    // ========================================================================
    // Packet Errors
    // ========================================================================
    /// A single audio packet failed to decode. The session remains usable.
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// A decode was attempted after the end-of-stream packet was decoded.
    #[error("Stream complete: end-of-stream packet already decoded")]
    StreamComplete,

    // ========================================================================
    // Lifecycle / Boundary Errors
    // ========================================================================
    /// The session was destroyed before this call.
    #[error("Decoder used after destroy")]
    UseAfterDestroy,

    /// A boundary argument (pointer slot, handle) was unusable.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Decoder configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Fieldless classification of a [`DecoderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    MalformedHeader,
    SequenceViolation,
    NotReady,
    EngineInitFailed,
    DecodeError,
    StreamComplete,
    UseAfterDestroy,
    InvalidArgument,
    InvalidConfig,
}

impl ErrorKind {
    /// Stable status code used at the C boundary. Success is `0`.
    pub fn code(self) -> i32 {
        match self {
            ErrorKind::MalformedHeader => -1,
            ErrorKind::SequenceViolation => -2,
            ErrorKind::NotReady => -3,
            ErrorKind::EngineInitFailed => -4,
            ErrorKind::DecodeError => -5,
            ErrorKind::StreamComplete => -6,
            ErrorKind::UseAfterDestroy => -7,
            ErrorKind::InvalidArgument => -8,
            ErrorKind::InvalidConfig => -9,
        }
    }

    /// Short human-readable name.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MalformedHeader => "malformed header",
            ErrorKind::SequenceViolation => "sequence violation",
            ErrorKind::NotReady => "not ready",
            ErrorKind::EngineInitFailed => "engine init failed",
            ErrorKind::DecodeError => "decode error",
            ErrorKind::StreamComplete => "stream complete",
            ErrorKind::UseAfterDestroy => "use after destroy",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::InvalidConfig => "invalid configuration",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DecoderError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecoderError::MalformedHeader(_) => ErrorKind::MalformedHeader,
            DecoderError::SequenceViolation(_) => ErrorKind::SequenceViolation,
            DecoderError::NotReady(_) => ErrorKind::NotReady,
            DecoderError::EngineInitFailed(_) => ErrorKind::EngineInitFailed,
            DecoderError::DecodeError(_) => ErrorKind::DecodeError,
            DecoderError::StreamComplete => ErrorKind::StreamComplete,
            DecoderError::UseAfterDestroy => ErrorKind::UseAfterDestroy,
            DecoderError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            DecoderError::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }

    /// Stable status code used at the C boundary.
    pub fn code(&self) -> i32 {
        self.kind().code()
    }

    /// Returns `true` if the session can continue with the next packet.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DecoderError::DecodeError(_))
    }

    /// Returns `true` if this error leaves the session unusable for decoding.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DecoderError::MalformedHeader(_)
                | DecoderError::SequenceViolation(_)
                | DecoderError::NotReady(_)
                | DecoderError::EngineInitFailed(_)
        )
    }
}

/// Result type for decoder operations.
pub type Result<T> = std::result::Result<T, DecoderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_decode_errors_are_recoverable() {
        assert!(DecoderError::DecodeError("bad packet".into()).is_recoverable());
        assert!(!DecoderError::StreamComplete.is_recoverable());
        assert!(!DecoderError::MalformedHeader("x".into()).is_recoverable());
        assert!(!DecoderError::UseAfterDestroy.is_recoverable());
    }

    #[test]
    fn test_fatal_classification() {
        assert!(DecoderError::SequenceViolation("x".into()).is_fatal());
        assert!(DecoderError::EngineInitFailed("x".into()).is_fatal());
        assert!(!DecoderError::DecodeError("x".into()).is_fatal());
        assert!(!DecoderError::StreamComplete.is_fatal());
    }

    #[test]
    fn test_codes_are_distinct_and_negative() {
        let kinds = [
            ErrorKind::MalformedHeader,
            ErrorKind::SequenceViolation,
            ErrorKind::NotReady,
            ErrorKind::EngineInitFailed,
            ErrorKind::DecodeError,
            ErrorKind::StreamComplete,
            ErrorKind::UseAfterDestroy,
            ErrorKind::InvalidArgument,
            ErrorKind::InvalidConfig,
        ];
        let mut codes: Vec<i32> = kinds.iter().map(|k| k.code()).collect();
        assert!(codes.iter().all(|&c| c < 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn test_display_text() {
        let err = DecoderError::MalformedHeader("channel count 0".into());
        assert_eq!(err.to_string(), "Malformed header: channel count 0");
        assert_eq!(err.kind().to_string(), "malformed header");
        assert_eq!(err.code(), -1);
    }
}

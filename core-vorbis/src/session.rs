//! Decode session lifecycle state and counters.

use crate::error::ErrorKind;
use crate::header::HeaderKind;
use serde::Serialize;
use std::fmt;

/// Lifecycle phase of a decode session.
///
/// ```text
/// Created ─ident─▶ HeaderId ─comment─▶ HeaderComment ─setup─▶ HeaderSetup
///                                                                  │ init
///                        Complete ◀─last page─ Decoding ◀─packet─ Initialized
///
/// any fatal error ─▶ Faulted(kind)        destroy ─▶ Destroyed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    /// No header consumed yet.
    Created,
    /// Identification header consumed.
    HeaderId,
    /// Comment header consumed.
    HeaderComment,
    /// Setup header consumed; the engine can be built.
    HeaderSetup,
    /// Engine built, no audio decoded yet.
    Initialized,
    Decoding,
    /// End-of-stream packet decoded.
    Complete,
    /// A fatal error occurred; only destroy (or an engine retry) is useful.
    Faulted(ErrorKind),
    Destroyed,
}

impl Phase {
    /// Header expected next while negotiating, `None` otherwise.
    pub fn expected_header(self) -> Option<HeaderKind> {
        match self {
            Phase::Created => Some(HeaderKind::Identification),
            Phase::HeaderId => Some(HeaderKind::Comment),
            Phase::HeaderComment => Some(HeaderKind::Setup),
            _ => None,
        }
    }

    /// Phase reached after consuming `kind`.
    pub fn after_header(kind: HeaderKind) -> Self {
        match kind {
            HeaderKind::Identification => Phase::HeaderId,
            HeaderKind::Comment => Phase::HeaderComment,
            HeaderKind::Setup => Phase::HeaderSetup,
        }
    }

    /// Returns `true` once the codec engine exists.
    pub fn is_initialized(self) -> bool {
        matches!(self, Phase::Initialized | Phase::Decoding | Phase::Complete)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Created => "created",
            Phase::HeaderId => "identification header read",
            Phase::HeaderComment => "comment header read",
            Phase::HeaderSetup => "setup header read",
            Phase::Initialized => "initialized",
            Phase::Decoding => "decoding",
            Phase::Complete => "complete",
            Phase::Faulted(_) => "faulted",
            Phase::Destroyed => "destroyed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Faulted(kind) => write!(f, "faulted ({})", kind),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Per-session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Audio packets handed to `decode_packets`, including rejected ones.
    pub packets_submitted: u64,
    pub packets_decoded: u64,
    /// Packets that ended in a recoverable decode error.
    pub packets_failed: u64,
    /// Bytes of audio packet data submitted.
    pub input_bytes: u64,
    /// Frames per channel produced so far.
    pub samples_decoded: u64,
    /// Last granule position seen on a decoded packet.
    pub last_granule: Option<u64>,
}

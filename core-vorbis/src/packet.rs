//! Ogg page metadata attached to each packet handed to the decoder.
//!
//! The demuxer is external: callers report the begin/end-of-stream flags and
//! the granule position of the page a packet came from, and the decoder treats
//! those values as authoritative.

use bytes::Bytes;
use serde::Serialize;
use std::fmt;

/// Granule position of a page, or unset.
///
/// Ogg uses `-1` for pages on which no packet ends; any negative raw value is
/// treated as unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct GranulePosition(Option<u64>);

impl GranulePosition {
    /// The "unset" sentinel.
    pub const UNSET: Self = Self(None);

    /// Interpret a raw 64-bit granule position from the container.
    pub fn from_raw(raw: i64) -> Self {
        u64::try_from(raw).map_or(Self::UNSET, |value| Self(Some(value)))
    }

    /// A set position.
    pub fn new(value: u64) -> Self {
        Self(Some(value))
    }

    pub fn get(self) -> Option<u64> {
        self.0
    }

    pub fn is_set(self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Display for GranulePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{}", value),
            None => f.write_str("unset"),
        }
    }
}

/// Page-boundary metadata supplied by the caller alongside a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageInfo {
    /// Packet sits on the first page of the logical stream (begin-of-stream).
    pub first_page: bool,
    /// Packet terminates the logical stream (end-of-stream).
    pub last_page: bool,
    /// Granule position of the page.
    pub granule_position: GranulePosition,
}

impl PageInfo {
    pub fn new(first_page: bool, last_page: bool, granule_position: i64) -> Self {
        Self {
            first_page,
            last_page,
            granule_position: GranulePosition::from_raw(granule_position),
        }
    }

    /// A packet from the middle of the stream with no granule position.
    pub fn continuation() -> Self {
        Self::default()
    }

    /// A packet from the first page of the stream.
    pub fn first() -> Self {
        Self {
            first_page: true,
            last_page: false,
            granule_position: GranulePosition::new(0),
        }
    }

    /// A packet from the last page of the stream.
    pub fn last(granule_position: i64) -> Self {
        Self::new(false, true, granule_position)
    }
}

/// Metadata of the packet currently being processed.
///
/// This is the owned half of the current packet view; the packet bytes stay
/// borrowed from the caller for the duration of the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketInfo {
    /// Sequence number assigned by the decoder, strictly increasing per session.
    pub sequence: u64,
    /// Packet length in bytes.
    pub len: usize,
    pub first_page: bool,
    pub last_page: bool,
    pub granule_position: GranulePosition,
}

/// A packet with its page metadata, as produced by a demuxer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OggPacket {
    pub data: Bytes,
    pub page: PageInfo,
}

impl OggPacket {
    pub fn new(data: impl Into<Bytes>, page: PageInfo) -> Self {
        Self {
            data: data.into(),
            page,
        }
    }
}

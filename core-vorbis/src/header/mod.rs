//! # Vorbis Header Packets
//!
//! Structural parsing of the three mandatory header packets:
//!
//! | Order | Packet type | Contents |
//! |-------|-------------|----------|
//! | 1 | `0x01` identification | channels, sample rate, bitrates, block sizes |
//! | 2 | `0x03` comment | vendor string and `KEY=value` entries |
//! | 3 | `0x05` setup | codebooks, floors, residues, mappings, modes |
//!
//! Every header starts with its packet type byte followed by the ASCII magic
//! `vorbis`. Multi-byte integers are little-endian. The setup header is only
//! validated structurally here; the codec engine interprets its bit-packed
//! configuration at initialization.

mod comment;
mod identification;
mod setup;

pub use comment::VorbisComment;
pub use identification::{IdentificationHeader, StreamParams, IDENTIFICATION_HEADER_LEN};
pub use setup::SetupHeader;

use crate::error::{DecoderError, Result};
use bytes::Buf;
use serde::Serialize;
use std::fmt;

/// Magic that follows the packet type byte of every header.
pub const VORBIS_MAGIC: &[u8; 6] = b"vorbis";

/// The three header packet kinds, in the order they must arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HeaderKind {
    Identification,
    Comment,
    Setup,
}

impl HeaderKind {
    /// Packet type byte that introduces this header.
    pub fn packet_type(self) -> u8 {
        match self {
            HeaderKind::Identification => 0x01,
            HeaderKind::Comment => 0x03,
            HeaderKind::Setup => 0x05,
        }
    }

    pub fn from_packet_type(packet_type: u8) -> Option<Self> {
        match packet_type {
            0x01 => Some(HeaderKind::Identification),
            0x03 => Some(HeaderKind::Comment),
            0x05 => Some(HeaderKind::Setup),
            _ => None,
        }
    }

    /// Classify a packet by its type byte alone.
    ///
    /// Returns `None` for empty packets and for audio packets (even type byte)
    /// or unknown odd types.
    pub fn classify(packet: &[u8]) -> Option<Self> {
        packet.first().copied().and_then(Self::from_packet_type)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HeaderKind::Identification => "identification",
            HeaderKind::Comment => "comment",
            HeaderKind::Setup => "setup",
        }
    }
}

impl fmt::Display for HeaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounds-checked little-endian reader over a header packet body.
pub(crate) struct HeaderReader<'a> {
    buf: &'a [u8],
    kind: HeaderKind,
}

impl<'a> HeaderReader<'a> {
    /// Validate the common preamble (type byte and magic) and position the
    /// reader on the first body byte.
    pub(crate) fn new(packet: &'a [u8], kind: HeaderKind) -> Result<Self> {
        let mut reader = Self { buf: packet, kind };

        let packet_type = reader.read_u8("packet type")?;
        if packet_type != kind.packet_type() {
            return Err(reader.malformed(format!(
                "packet type 0x{:02x} is not a {} header",
                packet_type, kind
            )));
        }

        let magic = reader.read_bytes(VORBIS_MAGIC.len(), "magic")?;
        if magic != VORBIS_MAGIC {
            return Err(reader.malformed("missing 'vorbis' magic".to_string()));
        }

        Ok(reader)
    }

    pub(crate) fn malformed(&self, detail: String) -> DecoderError {
        DecoderError::MalformedHeader(format!("{} header: {}", self.kind, detail))
    }

    fn ensure(&self, needed: usize, what: &str) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(self.malformed(format!(
                "truncated reading {} ({} bytes needed, {} left)",
                what,
                needed,
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    pub(crate) fn read_u8(&mut self, what: &str) -> Result<u8> {
        self.ensure(1, what)?;
        Ok(self.buf.get_u8())
    }

    pub(crate) fn read_u32_le(&mut self, what: &str) -> Result<u32> {
        self.ensure(4, what)?;
        Ok(self.buf.get_u32_le())
    }

    pub(crate) fn read_i32_le(&mut self, what: &str) -> Result<i32> {
        self.ensure(4, what)?;
        Ok(self.buf.get_i32_le())
    }

    pub(crate) fn read_bytes(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        self.ensure(len, what)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub(crate) fn rest(&self) -> &'a [u8] {
        self.buf
    }
}

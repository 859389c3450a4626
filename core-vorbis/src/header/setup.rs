use super::{HeaderKind, HeaderReader};
use crate::error::Result;

/// Sync pattern that opens every codebook.
const CODEBOOK_SYNC: &[u8; 3] = b"BCV";

/// Setup header, validated structurally and retained for the codec engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupHeader {
    codebook_count: u16,
    raw: Vec<u8>,
}

impl SetupHeader {
    /// Parse a setup header packet.
    ///
    /// Only the preamble, the first codebook sync pattern and the trailing
    /// framing bit are checked. The bit-packed body is left to the engine.
    pub fn parse(packet: &[u8]) -> Result<Self> {
        let mut reader = HeaderReader::new(packet, HeaderKind::Setup)?;

        let codebook_count = u16::from(reader.read_u8("codebook count")?) + 1;

        let sync = reader.read_bytes(CODEBOOK_SYNC.len(), "codebook sync")?;
        if sync != CODEBOOK_SYNC {
            return Err(reader.malformed(format!(
                "first codebook sync {:02x?} is not 'BCV'",
                sync
            )));
        }

        // The framing bit is the final bit written; the last byte can never be zero.
        if reader.rest().last().is_some_and(|&b| b == 0) {
            return Err(reader.malformed("framing bit not set".to_string()));
        }

        Ok(Self {
            codebook_count,
            raw: packet.to_vec(),
        })
    }

    pub fn codebook_count(&self) -> u16 {
        self.codebook_count
    }

    /// The packet bytes this header was parsed from.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}

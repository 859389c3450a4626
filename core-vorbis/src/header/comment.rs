use super::{HeaderKind, HeaderReader};
use crate::error::Result;
use serde::Serialize;

/// Parsed comment header: vendor string plus `KEY=value` user comments.
///
/// Keys are compared case-insensitively. Entries without `=` are kept with an
/// empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VorbisComment {
    pub vendor: String,
    pub entries: Vec<(String, String)>,
}

impl VorbisComment {
    /// Parse a comment header packet, accepting at most `max_entries` user
    /// comments.
    pub fn parse(packet: &[u8], max_entries: u32) -> Result<Self> {
        let mut reader = HeaderReader::new(packet, HeaderKind::Comment)?;

        let vendor_len = reader.read_u32_le("vendor length")? as usize;
        let vendor = String::from_utf8_lossy(reader.read_bytes(vendor_len, "vendor string")?)
            .into_owned();

        let count = reader.read_u32_le("comment count")?;
        if count > max_entries {
            return Err(reader.malformed(format!(
                "{} comment entries exceeds limit of {}",
                count, max_entries
            )));
        }

        // Each entry needs at least its 4-byte length prefix.
        if (count as usize).saturating_mul(4) > reader.remaining() {
            return Err(reader.malformed(format!(
                "{} comment entries cannot fit in {} bytes",
                count,
                reader.remaining()
            )));
        }

        let mut entries = Vec::with_capacity(count as usize);
        for index in 0..count {
            let len = reader.read_u32_le("comment length")? as usize;
            let raw = reader.read_bytes(len, "comment entry")?;
            let text = String::from_utf8_lossy(raw);
            let entry = match text.split_once('=') {
                Some((key, value)) => (key.to_string(), value.to_string()),
                None => (text.into_owned(), String::new()),
            };
            tracing::trace!(index, key = %entry.0, "Parsed comment entry");
            entries.push(entry);
        }

        let framing = reader.read_u8("framing flag")?;
        if framing & 0x01 == 0 {
            return Err(reader.malformed("framing bit not set".to_string()));
        }

        Ok(Self { vendor, entries })
    }

    /// First value for `key`, compared case-insensitively.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// All values for `key`, in stream order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

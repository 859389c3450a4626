use super::{HeaderKind, HeaderReader};
use crate::error::Result;
use serde::Serialize;

/// Size of a complete identification header packet.
pub const IDENTIFICATION_HEADER_LEN: usize = 30;

/// Stream parameters locked by the identification header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct StreamParams {
    /// Channel count, 1-255.
    pub channels: u8,
    /// Sample rate in Hz, always positive.
    pub sample_rate: u32,
}

/// Parsed identification header.
///
/// The raw packet is retained because the codec engine consumes it again at
/// initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentificationHeader {
    channels: u8,
    sample_rate: u32,
    bitrate_maximum: i32,
    bitrate_nominal: i32,
    bitrate_minimum: i32,
    blocksize_short: u16,
    blocksize_long: u16,
    raw: Vec<u8>,
}

impl IdentificationHeader {
    /// Parse an identification header packet.
    ///
    /// # Errors
    ///
    /// Returns `MalformedHeader` if the packet is not exactly an identification
    /// header, the version is not 0, the channel count or sample rate is zero,
    /// the block size exponents are outside 6..=13 or out of order, or the
    /// framing bit is clear.
    pub fn parse(packet: &[u8]) -> Result<Self> {
        let mut reader = HeaderReader::new(packet, HeaderKind::Identification)?;

        let version = reader.read_u32_le("version")?;
        if version != 0 {
            return Err(reader.malformed(format!("unsupported version {}", version)));
        }

        let channels = reader.read_u8("channel count")?;
        if channels == 0 {
            return Err(reader.malformed("channel count must be 1-255, got 0".to_string()));
        }

        let sample_rate = reader.read_u32_le("sample rate")?;
        if sample_rate == 0 {
            return Err(reader.malformed("sample rate must be positive".to_string()));
        }

        let bitrate_maximum = reader.read_i32_le("maximum bitrate")?;
        let bitrate_nominal = reader.read_i32_le("nominal bitrate")?;
        let bitrate_minimum = reader.read_i32_le("minimum bitrate")?;

        let blocksizes = reader.read_u8("block sizes")?;
        let exp_short = blocksizes & 0x0f;
        let exp_long = blocksizes >> 4;
        if !(6..=13).contains(&exp_short) || !(6..=13).contains(&exp_long) {
            return Err(reader.malformed(format!(
                "block size exponents {}/{} outside 6..=13",
                exp_short, exp_long
            )));
        }
        if exp_short > exp_long {
            return Err(reader.malformed(format!(
                "short block size 2^{} exceeds long block size 2^{}",
                exp_short, exp_long
            )));
        }

        let framing = reader.read_u8("framing flag")?;
        if framing & 0x01 == 0 {
            return Err(reader.malformed("framing bit not set".to_string()));
        }

        if reader.remaining() != 0 {
            return Err(reader.malformed(format!(
                "{} trailing bytes after framing flag",
                reader.remaining()
            )));
        }

        Ok(Self {
            channels,
            sample_rate,
            bitrate_maximum,
            bitrate_nominal,
            bitrate_minimum,
            blocksize_short: 1 << exp_short,
            blocksize_long: 1 << exp_long,
            raw: packet.to_vec(),
        })
    }

    pub fn stream_params(&self) -> StreamParams {
        StreamParams {
            channels: self.channels,
            sample_rate: self.sample_rate,
        }
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Bitrate hints in bits per second as (maximum, nominal, minimum).
    /// Zero or negative values mean "unset".
    pub fn bitrates(&self) -> (Option<u32>, Option<u32>, Option<u32>) {
        let hint = |value: i32| u32::try_from(value).ok().filter(|&v| v > 0);
        (
            hint(self.bitrate_maximum),
            hint(self.bitrate_nominal),
            hint(self.bitrate_minimum),
        )
    }

    /// Short and long block sizes in samples.
    pub fn blocksizes(&self) -> (u16, u16) {
        (self.blocksize_short, self.blocksize_long)
    }

    /// The packet bytes this header was parsed from.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecoderError;

    fn ident_packet(channels: u8, sample_rate: u32, blocksizes: u8) -> Vec<u8> {
        let mut packet = b"\x01vorbis".to_vec();
        packet.extend_from_slice(&0u32.to_le_bytes());
        packet.push(channels);
        packet.extend_from_slice(&sample_rate.to_le_bytes());
        packet.extend_from_slice(&0i32.to_le_bytes());
        packet.extend_from_slice(&128_000i32.to_le_bytes());
        packet.extend_from_slice(&(-1i32).to_le_bytes());
        packet.push(blocksizes);
        packet.push(0x01);
        packet
    }

    #[test]
    fn test_parse_stereo_44100() {
        let packet = ident_packet(2, 44_100, 0xb8);
        assert_eq!(packet.len(), IDENTIFICATION_HEADER_LEN);

        let header = IdentificationHeader::parse(&packet).unwrap();
        assert_eq!(
            header.stream_params(),
            StreamParams {
                channels: 2,
                sample_rate: 44_100
            }
        );
        assert_eq!(header.blocksizes(), (256, 2048));
        assert_eq!(header.bitrates(), (None, Some(128_000), None));
        assert_eq!(header.raw(), packet.as_slice());
    }

    #[test]
    fn test_rejects_zero_channels() {
        let err = IdentificationHeader::parse(&ident_packet(0, 44_100, 0xb8)).unwrap_err();
        assert!(matches!(err, DecoderError::MalformedHeader(ref m) if m.contains("channel")));
    }

    #[test]
    fn test_rejects_zero_sample_rate() {
        assert!(IdentificationHeader::parse(&ident_packet(1, 0, 0xb8)).is_err());
    }

    #[test]
    fn test_rejects_bad_blocksizes() {
        // exponent 5 is below the minimum
        assert!(IdentificationHeader::parse(&ident_packet(2, 48_000, 0xb5)).is_err());
        // short larger than long
        assert!(IdentificationHeader::parse(&ident_packet(2, 48_000, 0x8b)).is_err());
    }

    #[test]
    fn test_rejects_nonzero_version() {
        let mut packet = ident_packet(2, 44_100, 0xb8);
        packet[7] = 1;
        assert!(IdentificationHeader::parse(&packet).is_err());
    }

    #[test]
    fn test_rejects_missing_framing_bit() {
        let mut packet = ident_packet(2, 44_100, 0xb8);
        packet[29] = 0;
        assert!(IdentificationHeader::parse(&packet).is_err());
    }

    #[test]
    fn test_rejects_truncated_and_padded() {
        let packet = ident_packet(2, 44_100, 0xb8);
        assert!(IdentificationHeader::parse(&packet[..20]).is_err());

        let mut padded = packet.clone();
        padded.push(0);
        assert!(IdentificationHeader::parse(&padded).is_err());
    }
}

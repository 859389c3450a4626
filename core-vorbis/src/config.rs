//! # Decoder Configuration
//!
//! Configuration for a decode session: page-flag strictness and the size
//! limits applied to header packets and boundary error text.

use crate::error::{DecoderError, Result};
use crate::header::IDENTIFICATION_HEADER_LEN;
use serde::{Deserialize, Serialize};

/// Decode session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Validate the caller-supplied page flags against stream boundaries.
    ///
    /// When enabled, the identification header must carry the begin-of-stream
    /// flag, no later packet may carry it, and no header packet may carry the
    /// end-of-stream flag.
    ///
    /// Default: true.
    #[serde(default = "default_strict_page_flags")]
    pub strict_page_flags: bool,

    /// Largest header packet accepted, in bytes.
    ///
    /// Setup headers of real streams are typically a few kilobytes; the limit
    /// only guards against absurd allocations from corrupt input.
    ///
    /// Default: 16 MiB.
    #[serde(default = "default_max_header_bytes")]
    pub max_header_bytes: usize,

    /// Maximum number of user comment entries accepted in the comment header.
    ///
    /// Default: 65536.
    #[serde(default = "default_max_comment_entries")]
    pub max_comment_entries: u32,

    /// Maximum length of error text written to the boundary error slot, in
    /// bytes. Longer messages are cut on a UTF-8 character boundary.
    ///
    /// Default: 512.
    #[serde(default = "default_max_error_text_bytes")]
    pub max_error_text_bytes: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            strict_page_flags: default_strict_page_flags(),
            max_header_bytes: default_max_header_bytes(),
            max_comment_entries: default_max_comment_entries(),
            max_error_text_bytes: default_max_error_text_bytes(),
        }
    }
}

impl DecoderConfig {
    /// Configuration for demuxers that do not report page flags reliably.
    ///
    /// Page flags are still accepted but no longer validated.
    pub fn lenient() -> Self {
        Self {
            strict_page_flags: false,
            ..Default::default()
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.max_header_bytes < IDENTIFICATION_HEADER_LEN {
            return Err(DecoderError::InvalidConfig(format!(
                "max_header_bytes must be at least {}",
                IDENTIFICATION_HEADER_LEN
            )));
        }

        if self.max_error_text_bytes == 0 {
            return Err(DecoderError::InvalidConfig(
                "max_error_text_bytes must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Parse and validate a configuration from JSON. Missing fields take
    /// their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| DecoderError::InvalidConfig(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize this configuration to JSON.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| DecoderError::InvalidConfig(format!("Failed to serialize config: {}", e)))
    }

    /// Cut `message` to at most `max_error_text_bytes`, keeping valid UTF-8.
    pub fn truncate_error_text<'a>(&self, message: &'a str) -> &'a str {
        if message.len() <= self.max_error_text_bytes {
            return message;
        }

        let mut end = self.max_error_text_bytes;
        while end > 0 && !message.is_char_boundary(end) {
            end -= 1;
        }
        &message[..end]
    }
}

fn default_strict_page_flags() -> bool {
    true
}

fn default_max_header_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_max_comment_entries() -> u32 {
    65_536
}

fn default_max_error_text_bytes() -> usize {
    512
}

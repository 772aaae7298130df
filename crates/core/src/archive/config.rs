//! Configuration for the archive module.

use serde::{Deserialize, Serialize};

/// Deflate level applied to every entry. Always the maximum.
pub const COMPRESSION_LEVEL: i64 = 9;

/// Configuration for streamed ZIP archives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Size of the chunks handed to the response body.
    #[serde(default = "default_chunk_size")]
    pub chunk_size_bytes: usize,

    /// Chunks buffered between the archive writer and the response body.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_chunk_size() -> usize {
    64 * 1024
}

fn default_channel_capacity() -> usize {
    16
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            chunk_size_bytes: default_chunk_size(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ArchiveConfig::default();
        assert_eq!(config.chunk_size_bytes, 65_536);
        assert_eq!(config.channel_capacity, 16);
    }

    #[test]
    fn test_config_serialization() {
        let config = ArchiveConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ArchiveConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.chunk_size_bytes, config.chunk_size_bytes);
        assert_eq!(parsed.channel_capacity, config.channel_capacity);
    }
}

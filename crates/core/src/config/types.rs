use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::archive::ArchiveConfig;
use crate::converter::ConverterConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory the browser client is served from
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// Largest accepted request body (all uploads of one request together)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_max_body_bytes() -> usize {
    50 * 1024 * 1024 // 50 MiB
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.server.static_dir, PathBuf::from("public"));
        assert_eq!(config.server.max_body_bytes, 50 * 1024 * 1024);
        assert_eq!(config.converter.webp_quality, 80.0);
        assert_eq!(config.archive.chunk_size_bytes, 64 * 1024);
    }

    #[test]
    fn test_deserialize_server_section() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000
static_dir = "/srv/pixconv"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.server.static_dir, PathBuf::from("/srv/pixconv"));
        assert_eq!(config.server.max_body_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn test_deserialize_converter_and_archive() {
        let toml = r#"
[converter]
webp_quality = 65.0
max_image_width = 4096

# Not a setting; entries are always compressed at level 9
[archive]
compression_level = 1
channel_capacity = 4
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.converter.webp_quality, 65.0);
        assert_eq!(config.converter.max_image_width, 4096);
        assert_eq!(config.converter.max_image_height, 16_384);
        assert_eq!(config.archive.channel_capacity, 4);
    }

    #[test]
    fn test_deserialize_invalid_host_fails() {
        let toml = r#"
[server]
host = "not-an-ip"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }
}

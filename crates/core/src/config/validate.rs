use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Body limit is not 0
/// - WebP quality is within 0..=100
/// - Archive chunking values are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.server.max_body_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "server.max_body_bytes cannot be 0".to_string(),
        ));
    }

    let quality = config.converter.webp_quality;
    if !(0.0..=100.0).contains(&quality) {
        return Err(ConfigError::ValidationError(format!(
            "converter.webp_quality must be between 0 and 100, got {}",
            quality
        )));
    }

    if config.converter.max_image_width == 0 || config.converter.max_image_height == 0 {
        return Err(ConfigError::ValidationError(
            "converter.max_image_width and max_image_height cannot be 0".to_string(),
        ));
    }

    if config.archive.chunk_size_bytes == 0 || config.archive.channel_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "archive.chunk_size_bytes and channel_capacity cannot be 0".to_string(),
        ));
    }

    Ok(())
}

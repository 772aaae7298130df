pub mod archive;
pub mod config;
pub mod converter;
pub mod metrics;
pub mod testing;

pub use archive::{
    content_disposition, convert_into_archive, ArchiveConfig, ArchiveError, BatchItem,
    BatchSummary, SkippedItem, ZipStream, ARCHIVE_CONTENT_TYPE, ARCHIVE_FILE_NAME,
};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, ServerConfig,
};
pub use converter::{
    output_file_name, ConvertedImage, Converter, ConverterConfig, ConverterError,
    RasterConverter, TargetFormat,
};

//! Configuration module for the toilet review server.
//!
//! This module handles loading and validating configuration from TOML files.
//! Configuration can be loaded from a file path or from default locations.
//!
//! # Configuration Sources (in order of priority)
//! 1. `config.local.toml` - Local overrides (gitignored)
//! 2. `config.toml` - Main configuration file
//!
//! # Example
//! ```rust,ignore
//! let config = Config::load("config.toml")?;
//! println!("Server will listen on {}:{}", config.server.host, config.server.port);
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// MIME types the image store is able to hold
pub const SUPPORTED_IMAGE_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub images: ImageConfig,
    #[serde(default)]
    pub toilets: ToiletConfig,
    #[serde(default)]
    pub comments: CommentConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind the public API to
    pub host: String,
    /// Port for the public API
    pub port: u16,
    /// Host to bind the admin API to (should be localhost)
    pub admin_host: String,
    /// Port for the admin API
    pub admin_port: u16,
    /// Base URL for generating image URLs
    pub base_url: String,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base directory for all data (RocksDB lives in `data_dir/rocksdb`)
    pub data_dir: PathBuf,
    /// Directory for image blobs (relative to data_dir)
    pub images_dir: String,
    /// Number of directory nesting levels for blob storage (0-4).
    /// Each level uses 2 hex characters from the image UUID.
    #[serde(default = "default_directory_levels")]
    pub directory_levels: u8,
}

fn default_directory_levels() -> u8 {
    2
}

impl StorageConfig {
    /// Get the full path to the images directory
    pub fn images_path(&self) -> PathBuf {
        self.data_dir.join(&self.images_dir)
    }

    /// Get the full path to the RocksDB directory
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("rocksdb")
    }
}

/// Image upload and serving configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
    /// Maximum image size in bytes
    pub max_upload_size: u64,
    /// Accepted MIME types
    pub allowed_types: Vec<String>,
    /// Cache-Control max-age in seconds for served images
    pub cache_max_age: u64,
}

impl ImageConfig {
    /// Check if a MIME type is accepted for upload
    pub fn is_allowed_type(&self, mime_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == mime_type)
    }
}

/// Toilet search configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ToiletConfig {
    /// Radius used when a nearby query names none
    pub default_radius_km: f64,
    /// Result count used when a query names none
    pub default_max_results: usize,
    /// Upper bound for `maxToiletsToLoad`
    pub max_results_limit: usize,
    /// Hide toilets that are not approved from nearby queries
    #[serde(default)]
    pub nearby_only_approved: bool,
}

impl Default for ToiletConfig {
    fn default() -> Self {
        Self {
            default_radius_km: 5.0,
            default_max_results: 50,
            max_results_limit: 500,
            nearby_only_approved: false,
        }
    }
}

impl ToiletConfig {
    /// Resolve a requested result count against the configured bounds
    pub fn result_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_max_results)
            .min(self.max_results_limit)
    }
}

/// Comment configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CommentConfig {
    /// Maximum comment length in characters (after decoding)
    pub max_length: usize,
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self { max_length: 2000 }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Config {
    /// Load configuration from a file path
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed or validated
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations
    ///
    /// Tries to load from:
    /// 1. `config.local.toml` (if exists)
    /// 2. `config.toml`
    pub fn load_default() -> Result<Self, ConfigError> {
        if Path::new("config.local.toml").exists() {
            return Self::load("config.local.toml");
        }

        if Path::new("config.toml").exists() {
            return Self::load("config.toml");
        }

        Err(ConfigError::ValidationError(
            "No configuration file found. Expected config.toml or config.local.toml".to_string(),
        ))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.base_url.ends_with('/') {
            return Err(ConfigError::ValidationError(
                "base_url should not have a trailing slash".to_string(),
            ));
        }

        if self.storage.directory_levels > 4 {
            return Err(ConfigError::ValidationError(
                "directory_levels must be between 0 and 4".to_string(),
            ));
        }

        if self.images.allowed_types.is_empty() {
            return Err(ConfigError::ValidationError(
                "allowed_types must name at least one image type".to_string(),
            ));
        }

        if let Some(unknown) = self
            .images
            .allowed_types
            .iter()
            .find(|t| !SUPPORTED_IMAGE_TYPES.contains(&t.as_str()))
        {
            return Err(ConfigError::ValidationError(format!(
                "allowed_types entry '{}' must be one of: {:?}",
                unknown, SUPPORTED_IMAGE_TYPES
            )));
        }

        if !(self.toilets.default_radius_km > 0.0) {
            return Err(ConfigError::ValidationError(
                "default_radius_km must be positive".to_string(),
            ));
        }

        if self.toilets.default_max_results > self.toilets.max_results_limit {
            return Err(ConfigError::ValidationError(
                "default_max_results must be <= max_results_limit".to_string(),
            ));
        }

        if self.comments.max_length == 0 {
            return Err(ConfigError::ValidationError(
                "comments.max_length must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 3000
        admin_host = "127.0.0.1"
        admin_port = 3001
        base_url = "http://localhost:3000"

        [storage]
        data_dir = "/data"
        images_dir = "images"

        [images]
        max_upload_size = 1024
        allowed_types = ["image/jpeg", "image/png"]
        cache_max_age = 60

        [logging]
        level = "info"
        format = "pretty"
    "#;

    #[test]
    fn test_storage_paths() {
        let storage = StorageConfig {
            data_dir: PathBuf::from("/data"),
            images_dir: "images".to_string(),
            directory_levels: 2,
        };

        assert_eq!(storage.images_path(), PathBuf::from("/data/images"));
        assert_eq!(storage.database_path(), PathBuf::from("/data/rocksdb"));
    }

    #[test]
    fn test_sample_parses_with_defaults() {
        let config = Config::from_toml(SAMPLE).unwrap();

        assert_eq!(config.storage.directory_levels, 2);
        assert_eq!(config.toilets.default_max_results, 50);
        assert_eq!(config.comments.max_length, 2000);
        assert!(config.images.is_allowed_type("image/png"));
        assert!(!config.images.is_allowed_type("image/gif"));
    }

    #[test]
    fn test_rejects_unsupported_image_type() {
        let toml = SAMPLE.replace(
            r#"["image/jpeg", "image/png"]"#,
            r#"["image/jpeg", "image/gif"]"#,
        );

        assert!(matches!(
            Config::from_toml(&toml),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_rejects_trailing_slash() {
        let toml = SAMPLE.replace("http://localhost:3000", "http://localhost:3000/");
        assert!(Config::from_toml(&toml).is_err());
    }

    #[test]
    fn test_result_limit() {
        let toilets = ToiletConfig::default();

        assert_eq!(toilets.result_limit(None), 50);
        assert_eq!(toilets.result_limit(Some(10)), 10);
        assert_eq!(toilets.result_limit(Some(10_000)), 500);
    }
}

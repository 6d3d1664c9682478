//! Configuration management
//!
//! This module handles loading the s3desk configuration file.
//! The configuration file is stored in TOML format at ~/.config/s3desk/config.toml.
//! Command-line flags and environment variables are layered on top by the
//! binary; this module only knows about the file. s3desk never writes it.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Minimum length of the secret used to sign session cookies
pub const MIN_SESSION_SECRET_LEN: usize = 32;

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_BUCKET_LOOKUP: &str = "auto";
const DEFAULT_BIND: &str = "127.0.0.1:8080";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Schema version; files written for another version are rejected
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Storage provider settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Storage provider connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Custom endpoint for S3-compatible services; None uses AWS
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Region
    #[serde(default = "default_region")]
    pub region: String,

    /// Static access key; None falls back to the SDK credential chain
    #[serde(default)]
    pub access_key: Option<String>,

    /// Static secret key
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Bucket addressing: "auto", "path" or "dns"
    #[serde(default = "default_bucket_lookup")]
    pub bucket_lookup: String,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Secret used to sign flash-message cookies
    #[serde(default)]
    pub session_secret: Option<String>,

    /// Largest accepted upload body
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_bucket_lookup() -> String {
    DEFAULT_BUCKET_LOOKUP.to_string()
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: default_region(),
            access_key: None,
            secret_key: None,
            bucket_lookup: default_bucket_lookup(),
        }
    }
}

impl StorageConfig {
    /// Whether requests should use path-style addressing
    ///
    /// "auto" picks path style only for custom endpoints, which are usually
    /// self-hosted services without wildcard DNS.
    pub fn force_path_style(&self) -> bool {
        match self.bucket_lookup.as_str() {
            "path" => true,
            "dns" => false,
            _ => self.endpoint.is_some(),
        }
    }

    /// Access and secret key, when both are configured
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (&self.access_key, &self.secret_key) {
            (Some(access), Some(secret)) if !access.is_empty() && !secret.is_empty() => {
                Some((access.as_str(), secret.as_str()))
            }
            _ => None,
        }
    }

    /// Validate field values
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.bucket_lookup.as_str(), "auto" | "path" | "dns") {
            return Err(Error::Config(format!(
                "Invalid bucket_lookup '{}': expected auto, path or dns",
                self.bucket_lookup
            )));
        }
        if self.access_key.is_some() != self.secret_key.is_some() {
            return Err(Error::Config(
                "access_key and secret_key must be set together".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            session_secret: None,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl ServerConfig {
    /// Validate field values
    pub fn validate(&self) -> Result<()> {
        if let Some(secret) = &self.session_secret {
            if secret.len() < MIN_SESSION_SECRET_LEN {
                return Err(Error::Config(format!(
                    "session_secret must be at least {MIN_SESSION_SECRET_LEN} bytes"
                )));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.storage.validate()?;
        self.server.validate()
    }
}

/// Locates and loads the configuration file
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".into()))?;
        let config_path = config_dir.join("s3desk").join("config.toml");
        Ok(Self { config_path })
    }

    /// Create a ConfigManager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default configuration.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&content)?;

        if config.schema_version != SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "{}: unsupported schema_version {} (this s3desk reads version {})",
                self.config_path.display(),
                config.schema_version,
                SCHEMA_VERSION
            )));
        }

        tracing::debug!(path = %self.config_path.display(), "configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let manager = ConfigManager::with_path(config_path);
        (manager, temp_dir)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.storage.region, "us-east-1");
        assert_eq!(config.storage.bucket_lookup, "auto");
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert!(config.server.session_secret.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let (manager, _temp_dir) = temp_config_manager();
        let config = manager.load().unwrap();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn test_load_full_file() {
        let (manager, _temp_dir) = temp_config_manager();
        std::fs::write(
            manager.config_path(),
            r#"
schema_version = 1

[storage]
endpoint = "http://localhost:9000"
access_key = "minioadmin"
secret_key = "minioadmin"
bucket_lookup = "path"

[server]
bind = "0.0.0.0:3000"
"#,
        )
        .unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded.storage.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(
            loaded.storage.static_credentials(),
            Some(("minioadmin", "minioadmin"))
        );
        assert_eq!(loaded.storage.bucket_lookup, "path");
        assert_eq!(loaded.server.bind, "0.0.0.0:3000");
        assert!(loaded.validate().is_ok());
    }

    #[test]
    fn test_missing_schema_version_defaults_to_current() {
        let (manager, _temp_dir) = temp_config_manager();
        std::fs::write(manager.config_path(), "[server]\nbind = \"127.0.0.1:9999\"\n").unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.server.bind, "127.0.0.1:9999");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let (manager, _temp_dir) = temp_config_manager();
        std::fs::write(
            manager.config_path(),
            "schema_version = 1\n[storage]\nregion = \"eu-west-1\"\n",
        )
        .unwrap();

        let config = manager.load().unwrap();
        assert_eq!(config.storage.region, "eu-west-1");
        assert_eq!(config.storage.bucket_lookup, "auto");
        assert_eq!(config.server.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn test_unsupported_schema_version() {
        let (manager, _temp_dir) = temp_config_manager();

        let content = format!("schema_version = {}\n", SCHEMA_VERSION + 1);
        std::fs::write(manager.config_path(), content).unwrap();

        let result = manager.load();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("unsupported schema_version 2")
        );

        std::fs::write(manager.config_path(), "schema_version = 0\n").unwrap();
        assert!(manager.load().is_err());
    }

    #[test]
    fn test_force_path_style() {
        let mut storage = StorageConfig::default();
        assert!(!storage.force_path_style());

        storage.endpoint = Some("http://localhost:9000".into());
        assert!(storage.force_path_style());

        storage.bucket_lookup = "dns".into();
        assert!(!storage.force_path_style());

        storage.endpoint = None;
        storage.bucket_lookup = "path".into();
        assert!(storage.force_path_style());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.storage.bucket_lookup = "virtual".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.storage.access_key = Some("only-access".into());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.session_secret = Some("short".into());
        assert!(config.validate().is_err());

        config.server.session_secret = Some("x".repeat(MIN_SESSION_SECRET_LEN));
        assert!(config.validate().is_ok());
    }
}

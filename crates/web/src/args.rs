//! Command-line arguments
//!
//! Every flag can also be given through the environment. Values given here
//! override the configuration file.

use std::path::PathBuf;

use clap::Parser;
use s3desk_core::{Config, ConfigManager, Result};

/// s3desk - browse and manage S3-compatible object storage from a browser
#[derive(Parser, Debug)]
#[command(name = "s3desk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, env = "S3DESK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:8080
    #[arg(long, env = "S3DESK_BIND")]
    pub bind: Option<String>,

    /// Custom S3 endpoint URL
    #[arg(long, env = "S3DESK_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Region used for signing and bucket creation
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Access key ID
    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub access_key: Option<String>,

    /// Secret access key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Bucket addressing style: auto, path or dns
    #[arg(long, env = "S3DESK_BUCKET_LOOKUP")]
    pub bucket_lookup: Option<String>,

    /// Secret used to sign the flash cookie (at least 32 bytes)
    #[arg(long, env = "S3DESK_SESSION_SECRET", hide_env_values = true)]
    pub session_secret: Option<String>,

    /// Largest accepted request body in bytes
    #[arg(long, env = "S3DESK_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: Option<usize>,

    /// Enable debug logging
    #[arg(long, default_value = "false")]
    pub debug: bool,
}

impl Cli {
    /// Load the configuration file and apply overrides
    pub fn load_config(&self) -> Result<Config> {
        let manager = match &self.config {
            Some(path) => ConfigManager::with_path(path.clone()),
            None => ConfigManager::new()?,
        };
        let mut config = manager.load()?;
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Overwrite config values with the ones given on the command line
    pub fn apply(&self, config: &mut Config) {
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.storage.endpoint = Some(endpoint.clone());
        }
        if let Some(region) = &self.region {
            config.storage.region = region.clone();
        }
        if let Some(access_key) = &self.access_key {
            config.storage.access_key = Some(access_key.clone());
        }
        if let Some(secret_key) = &self.secret_key {
            config.storage.secret_key = Some(secret_key.clone());
        }
        if let Some(lookup) = &self.bucket_lookup {
            config.storage.bucket_lookup = lookup.clone();
        }
        if let Some(secret) = &self.session_secret {
            config.server.session_secret = Some(secret.clone());
        }
        if let Some(limit) = self.max_upload_bytes {
            config.server.max_upload_bytes = limit;
        }
    }

    /// Default log filter when `RUST_LOG` is unset
    pub fn default_log_filter(&self) -> &'static str {
        if self.debug {
            "s3desk=debug,s3desk_core=debug,s3desk_s3=debug,tower_http=debug"
        } else {
            "s3desk=info,s3desk_core=info,s3desk_s3=info,tower_http=info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "s3desk",
            "--bind",
            "0.0.0.0:9000",
            "--endpoint",
            "http://localhost:9000",
            "--region",
            "eu-west-1",
            "--access-key",
            "ak",
            "--secret-key",
            "sk",
            "--bucket-lookup",
            "path",
            "--max-upload-bytes",
            "1024",
        ])
        .unwrap();

        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.storage.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.storage.region, "eu-west-1");
        assert_eq!(config.storage.static_credentials(), Some(("ak", "sk")));
        assert_eq!(config.storage.bucket_lookup, "path");
        assert_eq!(config.server.max_upload_bytes, 1024);
    }

    #[test]
    fn test_config_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "schema_version = 1\n[server]\nbind = \"127.0.0.1:7000\"\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from(["s3desk", "--config", path.to_str().unwrap()]).unwrap();
        let config = cli.load_config().unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:7000");
    }

    #[test]
    fn test_short_session_secret_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "s3desk",
            "--config",
            dir.path().join("missing.toml").to_str().unwrap(),
            "--session-secret",
            "too-short",
        ])
        .unwrap();
        assert!(cli.load_config().is_err());
    }

    #[test]
    fn test_debug_filter() {
        let cli = Cli::try_parse_from(["s3desk", "--debug"]).unwrap();
        assert!(cli.default_log_filter().starts_with("s3desk=debug"));
    }
}

//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `OSSRELAY_CONFIG`
//! environment variable. A missing file is not an error: every field has a default.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `OSSRELAY_` override YAML values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `OSSRELAY_STORAGE__BUCKET=media` sets the `storage.bucket` field.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use ossrelay::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}:{}", config.host, config.port);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration Structure
//!
//! - **Server**: `host`, `port` - HTTP server binding configuration
//! - **Storage**: `storage.backend`, `storage.bucket`, `storage.region` - where relayed files go
//! - **Upstream**: `upstream.view_path`, `upstream.fetch_timeout` - how files are fetched
//! - **Features**: `enable_metrics`, `enable_otel_export` - Optional feature toggles
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! OSSRELAY_PORT=8080
//! OSSRELAY_STORAGE__BUCKET=cuz-comfy
//! OSSRELAY_STORAGE__REGION=cn-hangzhou
//! OSSRELAY_UPSTREAM__FETCH_TIMEOUT=30s
//! ```
//!
//! OSS credentials are not part of this file; see [`crate::storage::oss`].

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "OSSRELAY_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// All fields have defaults matching the production deployment, so an empty file is valid.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Object storage the relayed files are written to
    pub storage: StorageConfig,
    /// How files are fetched from the AI server
    pub upstream: UpstreamConfig,
    /// Enable Prometheus metrics endpoint at `/internal/metrics`
    pub enable_metrics: bool,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8288,
            storage: StorageConfig::default(),
            upstream: UpstreamConfig::default(),
            enable_metrics: false,
            enable_otel_export: false,
        }
    }
}

/// Which [`crate::storage::ObjectStore`] implementation backs the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// S3-compatible OSS bucket
    #[default]
    Oss,
    /// Process-local map; objects are lost on restart
    Memory,
}

/// Object storage configuration.
///
/// Bucket and region are process-wide: every request writes to the same bucket.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Bucket name
    pub bucket: String,
    /// OSS region, e.g. `cn-hangzhou`
    pub region: String,
    /// S3 API endpoint (default: `https://oss-{region}.aliyuncs.com`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Url>,
    /// Domain public URLs are built on, below the bucket (default: `oss-{region}.aliyuncs.com`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_domain: Option<String>,
    /// Image processing style appended to image URLs as `x-oss-process=style/{thumbnail_style}`
    pub thumbnail_style: String,
    /// Address buckets by path instead of by subdomain (needed by some S3 emulators)
    pub force_path_style: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            bucket: "cuz-comfy".to_string(),
            region: "cn-hangzhou".to_string(),
            endpoint: None,
            public_domain: None,
            thumbnail_style: "small".to_string(),
            force_path_style: false,
        }
    }
}

impl StorageConfig {
    pub fn endpoint_url(&self) -> String {
        match &self.endpoint {
            Some(url) => url.as_str().trim_end_matches('/').to_string(),
            None => format!("https://oss-{}.aliyuncs.com", self.region),
        }
    }

    pub fn public_domain(&self) -> String {
        self.public_domain
            .clone()
            .unwrap_or_else(|| format!("oss-{}.aliyuncs.com", self.region))
    }
}

/// Upstream AI server configuration.
///
/// The server address itself arrives with each request; only the shape of the fetch is
/// configured here.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Path of the file view endpoint
    pub view_path: String,
    /// Value of the `type` query parameter
    pub file_type: String,
    /// Per-file fetch timeout. Unset means wait indefinitely.
    #[serde(with = "humantime_serde")]
    pub fetch_timeout: Option<Duration>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            view_path: "/view".to_string(),
            file_type: "output".to_string(),
            fetch_timeout: None,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |message: &str| Err(Error::Other(anyhow::anyhow!("Config validation: {message}")));

        if self.storage.bucket.trim().is_empty() {
            return invalid("storage.bucket cannot be empty");
        }

        if self.storage.region.trim().is_empty() {
            return invalid("storage.region cannot be empty");
        }

        if self.storage.thumbnail_style.trim().is_empty() {
            return invalid("storage.thumbnail_style cannot be empty");
        }

        if !self.upstream.view_path.starts_with('/') {
            return invalid("upstream.view_path must start with '/'");
        }

        if self.upstream.fetch_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return invalid("upstream.fetch_timeout must be positive; leave it unset to disable the timeout");
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values. OSSRELAY_CONFIG names the
            // file itself and is not a config key.
            .merge(Env::prefixed("OSSRELAY_").ignore(&["CONFIG"]).split("__"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn args(path: &str) -> Args {
        Args {
            config: path.to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load(&args("missing.yaml"))?;

            assert_eq!(config.port, 8288);
            assert_eq!(config.storage.backend, StorageBackend::Oss);
            assert_eq!(config.storage.bucket, "cuz-comfy");
            assert_eq!(config.storage.endpoint_url(), "https://oss-cn-hangzhou.aliyuncs.com");
            assert_eq!(config.storage.public_domain(), "oss-cn-hangzhou.aliyuncs.com");
            assert_eq!(config.upstream.view_path, "/view");
            assert_eq!(config.upstream.fetch_timeout, None);

            Ok(())
        });
    }

    #[test]
    fn test_yaml_config() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
port: 8080
storage:
  backend: memory
  bucket: media
  region: cn-shanghai
  endpoint: http://localhost:9000/
  public_domain: cdn.example.com
  force_path_style: true
upstream:
  fetch_timeout: 30s
"#,
            )?;

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.port, 8080);
            assert_eq!(config.storage.backend, StorageBackend::Memory);
            assert_eq!(config.storage.bucket, "media");
            assert_eq!(config.storage.endpoint_url(), "http://localhost:9000");
            assert_eq!(config.storage.public_domain(), "cdn.example.com");
            assert!(config.storage.force_path_style);
            assert_eq!(config.storage.thumbnail_style, "small"); // still default
            assert_eq!(config.upstream.fetch_timeout, Some(Duration::from_secs(30)));

            Ok(())
        });
    }

    #[test]
    fn test_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
storage:
  bucket: from-yaml
  region: cn-beijing
"#,
            )?;

            jail.set_env("OSSRELAY_HOST", "127.0.0.1");
            jail.set_env("OSSRELAY_PORT", "9090");
            jail.set_env("OSSRELAY_STORAGE__BUCKET", "from-env");

            let config = Config::load(&args("test.yaml"))?;

            // Env vars should override
            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.port, 9090);
            assert_eq!(config.storage.bucket, "from-env");

            // YAML values should be preserved
            assert_eq!(config.storage.region, "cn-beijing");
            assert_eq!(config.bind_address(), "127.0.0.1:9090");

            Ok(())
        });
    }

    #[test]
    fn test_unknown_fields_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "storage:\n  bukket: typo\n")?;

            assert!(Config::load(&args("test.yaml")).is_err());

            Ok(())
        });
    }

    #[test]
    fn test_config_validation_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_empty_bucket() {
        let mut config = Config::default();
        config.storage.bucket = String::new();

        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("storage.bucket"));
    }

    #[test]
    fn test_config_validation_view_path() {
        let mut config = Config::default();
        config.upstream.view_path = "view".to_string();

        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("view_path"));
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = Config::default();
        config.upstream.fetch_timeout = Some(Duration::ZERO);

        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("fetch_timeout"));
    }
}

//! Configuration file support for audiograph.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `AUDIOGRAPH_`, e.g., `AUDIOGRAPH_API_HOST`)
//! 3. Config file (~/.config/audiograph/config.toml or ./audiograph.toml)
//! 4. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [api]
//! host = "https://api.soundcloud.com"  # optional, this is the default
//! client_id = "..."                    # or use AUDIOGRAPH_CLIENT_ID env var
//!
//! [sync]
//! concurrency = 8
//! timeout_secs = 30
//!
//! [retry]
//! max_retries = 5
//! ```

use std::path::PathBuf;
use std::time::Duration;

use audiograph::sync::{DEFAULT_SWEEP_CONCURRENCY, MAX_TRANSPORT_RETRIES};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote API configuration.
    pub api: ApiConfig,
    /// Default sync options.
    pub sync: SyncConfig,
    /// Transport retry tuning.
    pub retry: RetryConfig,
}

/// Remote API configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the collection API.
    /// Can also be set via the AUDIOGRAPH_API_HOST environment variable.
    pub host: String,
    /// Client identifier appended to every request URL.
    /// Can also be set via the AUDIOGRAPH_CLIENT_ID environment variable.
    pub client_id: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: audiograph::DEFAULT_HOST.to_string(),
            client_id: None,
        }
    }
}

/// Default sync options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum concurrent favorites fetches during a sweep.
    pub concurrency: usize,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_SWEEP_CONCURRENCY,
            timeout_secs: 30,
        }
    }
}

/// Transport retry tuning.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum retry attempts for transient transport failures.
    pub max_retries: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: MAX_TRANSPORT_RETRIES as usize,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/audiograph/config.toml)
    /// 3. Local config file (./audiograph.toml)
    /// 4. Environment variables with AUDIOGRAPH_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        // Add XDG config file if it exists
        if let Some(proj_dirs) = ProjectDirs::from("", "", "audiograph") {
            let xdg_config = proj_dirs.config_dir().join("config.toml");
            if xdg_config.exists() {
                tracing::debug!("Loading config from {:?}", xdg_config);
                builder = builder.add_source(
                    File::from(xdg_config)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        // Add local config file (higher priority than XDG)
        let local_config = PathBuf::from("audiograph.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./audiograph.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // Add AUDIOGRAPH_ prefixed environment variables
        // e.g., AUDIOGRAPH_API_HOST -> api.host
        builder = builder.add_source(
            Environment::with_prefix("AUDIOGRAPH")
                .separator("_")
                .try_parsing(true),
        );

        // Build the config and deserialize
        let mut config = match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        };

        // The separator mapping cannot express keys that themselves
        // contain an underscore, so the client id is read directly.
        if let Ok(client_id) = std::env::var("AUDIOGRAPH_CLIENT_ID") {
            config.api.client_id = Some(client_id);
        }

        config
    }

    /// HTTP request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.sync.timeout_secs)
    }

    /// Retry policy for the transport layer.
    ///
    /// Delay bounds and jitter come from the library defaults; only the
    /// attempt count is configurable here.
    pub fn retry_config(&self) -> audiograph::RetryConfig {
        audiograph::RetryConfig {
            max_retries: self.retry.max_retries,
            ..audiograph::RetryConfig::default()
        }
    }
}

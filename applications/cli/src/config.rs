/// CLI configuration
use crate::error::{CliError, Result};
use cadence_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "cadence.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CadenceConfig {
    #[serde(default = "default_provider")]
    pub provider: ProviderSettings,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default = "default_session")]
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token for the track API
    #[serde(default)]
    pub token: Option<String>,

    /// JSON file of provider tracks to use instead of the API
    #[serde(default)]
    pub library_path: Option<PathBuf>,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionSettings {
    /// Seconds to wait for track metadata before skipping
    #[serde(default = "default_load_timeout_secs")]
    pub load_timeout_secs: u64,

    /// Simulated device position update interval
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Simulated length for tracks without a known duration
    #[serde(default = "default_fallback_track_secs")]
    pub fallback_track_secs: f64,
}

impl ProviderSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SessionSettings {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl CadenceConfig {
    /// Load configuration from file and environment
    ///
    /// Reads `path` if given (it must exist), otherwise `cadence.toml` in the
    /// working directory if present. `CADENCE_*` variables override both.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, None)
    }

    /// Load configuration with an explicit environment map
    ///
    /// `None` reads the process environment.
    pub fn load_from(path: Option<&Path>, env: Option<config::Map<String, String>>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                // Load from config file if it exists
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (e.g. CADENCE_PROVIDER__BASE_URL)
        settings = settings.add_source(
            config::Environment::with_prefix("CADENCE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config = settings
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.provider.library_path.is_none() {
            let url = self.provider.base_url.trim();
            if url.is_empty() {
                return Err(CliError::Config(
                    "Provider URL is required (set CADENCE_PROVIDER__BASE_URL)".to_string(),
                ));
            }

            let parsed = Url::parse(url)
                .map_err(|e| CliError::Config(format!("Invalid provider URL {:?}: {}", url, e)))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(CliError::Config(format!(
                    "Provider URL must be http or https, got {}",
                    parsed.scheme()
                )));
            }
        }

        if self.provider.page_size == 0 {
            return Err(CliError::Config("Page size must be at least 1".to_string()));
        }

        if self.session.tick_interval_ms == 0 {
            return Err(CliError::Config(
                "Tick interval must be at least 1ms".to_string(),
            ));
        }

        if !self.session.fallback_track_secs.is_finite() || self.session.fallback_track_secs <= 0.0
        {
            return Err(CliError::Config(
                "Fallback track length must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CliError::Config(e.to_string()))
    }
}

// Default values
fn default_provider() -> ProviderSettings {
    ProviderSettings {
        base_url: default_base_url(),
        token: None,
        library_path: None,
        page_size: default_page_size(),
        timeout_secs: default_timeout_secs(),
    }
}

fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_page_size() -> u32 {
    50
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_session() -> SessionSettings {
    SessionSettings {
        load_timeout_secs: default_load_timeout_secs(),
        tick_interval_ms: default_tick_interval_ms(),
        fallback_track_secs: default_fallback_track_secs(),
    }
}

fn default_load_timeout_secs() -> u64 {
    10
}

fn default_tick_interval_ms() -> u64 {
    250
}

fn default_fallback_track_secs() -> f64 {
    30.0
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            playback: PlaybackConfig::default(),
            session: default_session(),
        }
    }
}

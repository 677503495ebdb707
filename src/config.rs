use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Bus
    pub mqtt_host: String,
    #[serde(default = "default_mqtt_port")]
    pub mqtt_port: u16,
    pub mqtt_prefix: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,

    // Timing (seconds)
    pub interval: u64,
    #[serde(default)]
    pub reconnect_interval: Option<u64>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    // Files
    pub sounds_path: PathBuf,
    pub speech_path: PathBuf,
    pub model: PathBuf,

    // Audio
    pub device: String,
    #[serde(default)]
    pub mixer_card: u32,
    #[serde(default = "default_mixer_control")]
    pub mixer_control: String,

    // Button
    #[serde(default = "default_button_pin")]
    pub button_pin: u32,
    #[serde(default = "default_gpio_root")]
    pub gpio_root: PathBuf,

    // External tools
    #[serde(default = "default_aplay_bin")]
    pub aplay_bin: String,
    #[serde(default = "default_amixer_bin")]
    pub amixer_bin: String,
    #[serde(default = "default_piper_bin")]
    pub piper_bin: String,
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    format!("butler-{}", std::process::id())
}

fn default_poll_interval_ms() -> u64 {
    200
}

fn default_mixer_control() -> String {
    "Master".to_string()
}

/// BCM numbering; physical board pin 16.
fn default_button_pin() -> u32 {
    23
}

fn default_gpio_root() -> PathBuf {
    PathBuf::from("/sys/class/gpio")
}

fn default_aplay_bin() -> String {
    "aplay".to_string()
}

fn default_amixer_bin() -> String {
    "amixer".to_string()
}

fn default_piper_bin() -> String {
    "piper".to_string()
}

impl Config {
    /// Load and validate the YAML config at `path`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        tracing::info!("📄 Reading config from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
                path: PathBuf::new(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.mqtt_prefix.trim_matches('/').is_empty() {
            return Err(ConfigError::Invalid("mqtt_prefix must not be empty".into()));
        }
        if self.mqtt_prefix.contains(['#', '+']) {
            return Err(ConfigError::Invalid(format!(
                "mqtt_prefix {:?} must not contain wildcards",
                self.mqtt_prefix
            )));
        }
        if self.interval == 0 || self.reconnect_interval == Some(0) {
            return Err(ConfigError::Invalid("intervals must be positive".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be positive".into()));
        }
        Ok(())
    }

    /// Topic prefix without a trailing slash
    pub fn prefix(&self) -> &str {
        self.mqtt_prefix.trim_end_matches('/')
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.reconnect_interval.unwrap_or(self.interval))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Resolve the config path: explicit flag, then `CONFIG_FILE`, then the user config dir
pub fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| std::env::var_os("CONFIG_FILE").map(PathBuf::from))
        .unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("butler")
                .join("config.yaml")
        })
}

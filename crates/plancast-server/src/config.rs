//! Server configuration.

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// Origin allowed on the WebSocket handshake; "*" allows any.
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
    /// Grace period before a session whose admin disconnected is deleted.
    #[serde(default = "default_admin_grace_secs")]
    pub admin_grace_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./public")
}

fn default_allowed_origin() -> String {
    "*".to_string()
}

fn default_admin_grace_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            allowed_origin: default_allowed_origin(),
            admin_grace_secs: default_admin_grace_secs(),
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config from default location (config/default.toml) or fall back to defaults.
    pub fn load() -> Result<Self> {
        let config_path = PathBuf::from("config/default.toml");
        if config_path.exists() {
            return Self::load_from(&config_path);
        }

        Ok(Config::default())
    }
}

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::session::SessionConfig;
use crate::sound::SoundConfig;
use crate::transport::SocketIoConfig;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub session: SessionSettings,
    pub http: HttpConfig,
    pub alerts: AlertsConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Detection backend base URL (Socket.IO endpoint host)
    pub url: String,
    /// Base URL for result artifacts (defaults to `url`)
    pub api_base_url: Option<String>,
    pub reconnect_delay_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5000".to_string(),
            api_base_url: None,
            reconnect_delay_ms: 2000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Fixed room ID; generated per run when unset
    pub session_id: Option<String>,
    pub history_capacity: usize,
    pub weapon_cooldown_ms: u64,
    pub weapon_keyword: String,
    pub muted: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session_id: None,
            history_capacity: 200,
            weapon_cooldown_ms: 4000,
            weapon_keyword: "gun".to_string(),
            muted: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub enabled: bool,
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    /// Audio file for the weapon alert
    pub weapon_sound_path: Option<PathBuf>,
    /// Directory for JPEGs of alerted frames
    pub frames_dir: Option<PathBuf>,
}

impl Config {
    /// Load `<path>.{toml,yaml,json,...}` if present, then `ARMORY_WATCH__*` overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("ARMORY_WATCH").separator("__"))
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn session_config(&self) -> SessionConfig {
        let mut session = match &self.session.session_id {
            Some(id) => SessionConfig::with_session_id(id.clone()),
            None => SessionConfig::default(),
        };

        session.history_capacity = self.session.history_capacity;
        session.weapon_cooldown = Duration::from_millis(self.session.weapon_cooldown_ms);
        session.weapon_keyword = self.session.weapon_keyword.clone();
        session.api_base_url = self
            .server
            .api_base_url
            .clone()
            .unwrap_or_else(|| self.server.url.clone());
        session.alert_frames_dir = self.alerts.frames_dir.clone();
        session.muted = self.session.muted;
        session
    }

    pub fn socket_config(&self) -> SocketIoConfig {
        SocketIoConfig {
            url: self.server.url.clone(),
            reconnect_delay: Duration::from_millis(self.server.reconnect_delay_ms),
            ..SocketIoConfig::default()
        }
    }

    pub fn sound_config(&self) -> SoundConfig {
        SoundConfig {
            weapon_sound_path: self.alerts.weapon_sound_path.clone(),
        }
    }
}

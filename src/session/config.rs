use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a detection session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Room identifier shared with the uploader (e.g., "session-3f2a...")
    pub session_id: String,

    /// Maximum number of frames with detections kept in history
    /// Default: 200
    pub history_capacity: usize,

    /// Minimum interval between two weapon alert sounds
    /// Default: 4 seconds
    pub weapon_cooldown: Duration,

    /// Case-insensitive substring marking a firearm class label
    pub weapon_keyword: String,

    /// Base URL prefixed to the finished artifact path
    pub api_base_url: String,

    /// Directory for JPEGs of alerted frames (disabled if unset)
    pub alert_frames_dir: Option<PathBuf>,

    /// Start with alert sounds muted
    pub muted: bool,
}

impl SessionConfig {
    /// Default config with a fixed session ID
    pub fn with_session_id(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("session-{}", uuid::Uuid::new_v4()),
            history_capacity: 200,
            weapon_cooldown: Duration::from_millis(4000),
            weapon_keyword: "gun".to_string(),
            api_base_url: "http://localhost:5000".to_string(),
            alert_frames_dir: None,
            muted: false,
        }
    }
}

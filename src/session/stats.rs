use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::alert::Alert;
use super::events::FrameImage;
use crate::transport::ConnectionState;

/// Latest frame seen, with or without detections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveFrame {
    pub frame_index: i64,
    pub timestamp: String,
    pub detections_count: usize,
}

/// Finished artifact reported by the remote job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Server-relative path (e.g., "/api/detect/results/video/x.webm")
    pub result_path: Option<String>,
    /// `result_path` joined to the API base URL
    pub result_url: Option<String>,
    /// Distinct object tracks across the whole video
    pub unique_tracks: Option<u64>,
}

/// Everything the presentation layer can observe about a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Room this client joined
    pub session_id: String,

    /// Transport connection state
    pub connection: ConnectionState,

    /// Whether the room has been joined on the current connection
    pub joined: bool,

    /// Whether a remote job is running
    pub processing: bool,

    /// Whether alert sounds are muted
    pub muted: bool,

    /// Displayed progress (0..=99 while running, 100 when complete)
    pub progress_percent: i32,

    /// Latest frame projection
    pub live_frame: Option<LiveFrame>,

    /// Encoded image of the latest frame, served separately
    #[serde(skip)]
    pub live_image: Option<FrameImage>,

    /// Current alert, if any
    pub alert: Option<Alert>,

    /// Final artifact, once complete
    pub result: Option<DetectionResult>,

    /// Last error reported by the remote job
    pub last_error: Option<String>,

    /// Media file selected for upload
    pub selected_input: Option<PathBuf>,

    /// Number of frames currently in history
    pub history_len: usize,
}

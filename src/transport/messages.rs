use serde::{Deserialize, Serialize};

/// `video_processing_started` payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartedMessage {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub result_filename: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A single detection inside a `frame_detection` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionMessage {
    pub class: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub bbox: [f64; 4],
    #[serde(default)]
    pub track_id: Option<i64>,
}

/// `frame_detection` payload, one analyzed frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameDetectionMessage {
    pub frame_index: i64,
    #[serde(default)]
    pub timestamp: String,
    pub detections: Vec<DetectionMessage>,
    #[serde(default)]
    pub image_base64: Option<String>, // Base64-encoded JPEG
}

/// `video_processing_progress` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressMessage {
    pub progress: f64,
    #[serde(default)]
    pub frame_index: Option<i64>,
    #[serde(default, rename = "processedFrames")]
    pub processed_frames: Option<u64>,
    #[serde(default, rename = "totalFrames")]
    pub total_frames: Option<u64>,
}

/// `video_processing_complete` payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompleteMessage {
    #[serde(default)]
    pub result_path: Option<String>,
    #[serde(default, rename = "uniqueTracks")]
    pub unique_tracks: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `video_processing_error` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub error: String,
}

/// Outbound `join` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinMessage {
    pub room: String,
}

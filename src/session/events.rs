use anyhow::{Context, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::transport::messages::{
    CompleteMessage, DetectionMessage, ErrorMessage, FrameDetectionMessage, ProgressMessage,
    StartedMessage,
};

/// One detected object in a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class: String,
    pub confidence: f64,
    pub bbox: [f64; 4],
    pub track_id: Option<i64>,
}

/// Base64-encoded JPEG carried by a frame event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameImage(String);

impl FrameImage {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Decode into raw JPEG bytes
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(self.0.as_bytes())
            .context("Frame image is not valid base64")
    }
}

/// One analyzed frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameEvent {
    pub frame_index: i64,
    pub timestamp: String,
    pub detections: Vec<Detection>,
    pub image: Option<FrameImage>,
}

/// Remote job accepted the session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStartedEvent {
    pub filename: Option<String>,
    pub message: Option<String>,
}

/// Coarse completion percentage, in whatever range the producer sends
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub percent: f64,
    pub frame_index: Option<i64>,
    pub processed_frames: Option<u64>,
    pub total_frames: Option<u64>,
}

impl ProgressEvent {
    pub fn new(percent: f64) -> Self {
        Self {
            percent,
            frame_index: None,
            processed_frames: None,
            total_frames: None,
        }
    }
}

/// Remote job finished
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionEvent {
    pub result_path: Option<String>,
    pub unique_tracks: Option<u64>,
    pub message: Option<String>,
}

/// Remote job failed
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEvent {
    pub message: String,
}

/// Classified inbound message
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    SessionStarted(SessionStartedEvent),
    Frame(FrameEvent),
    Progress(ProgressEvent),
    Complete(CompletionEvent),
    Error(ErrorEvent),
    /// Not part of the detection stream, or malformed
    Other { name: String },
}

impl From<DetectionMessage> for Detection {
    fn from(msg: DetectionMessage) -> Self {
        Self {
            class: msg.class,
            confidence: msg.confidence,
            bbox: msg.bbox,
            track_id: msg.track_id,
        }
    }
}

impl From<FrameDetectionMessage> for FrameEvent {
    fn from(msg: FrameDetectionMessage) -> Self {
        Self {
            frame_index: msg.frame_index,
            timestamp: msg.timestamp,
            detections: msg.detections.into_iter().map(Detection::from).collect(),
            image: msg
                .image_base64
                .filter(|encoded| !encoded.is_empty())
                .map(FrameImage::new),
        }
    }
}

impl From<StartedMessage> for SessionStartedEvent {
    fn from(msg: StartedMessage) -> Self {
        Self {
            filename: msg.filename,
            message: msg.message,
        }
    }
}

impl From<ProgressMessage> for ProgressEvent {
    fn from(msg: ProgressMessage) -> Self {
        Self {
            percent: msg.progress,
            frame_index: msg.frame_index,
            processed_frames: msg.processed_frames,
            total_frames: msg.total_frames,
        }
    }
}

impl From<CompleteMessage> for CompletionEvent {
    fn from(msg: CompleteMessage) -> Self {
        Self {
            result_path: msg.result_path,
            unique_tracks: msg.unique_tracks,
            message: msg.message,
        }
    }
}

impl From<ErrorMessage> for ErrorEvent {
    fn from(msg: ErrorMessage) -> Self {
        Self { message: msg.error }
    }
}

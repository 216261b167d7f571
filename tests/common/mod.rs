// Shared test doubles and builders

#![allow(dead_code)]

use anyhow::Result;
use armory_watch::session::{Detection, FrameEvent, FrameImage, MediaSurface};
use armory_watch::sound::{SoundCategory, SoundPlayer};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Records every sound request instead of playing it
#[derive(Clone, Default)]
pub struct RecordingPlayer {
    calls: Arc<Mutex<Vec<SoundCategory>>>,
    fail: bool,
}

impl RecordingPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A player whose backend always errors (requests are still recorded)
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<SoundCategory> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, category: SoundCategory) -> usize {
        self.calls().iter().filter(|c| **c == category).count()
    }

    fn record(&self, category: SoundCategory) -> Result<()> {
        self.calls.lock().unwrap().push(category);
        if self.fail {
            anyhow::bail!("autoplay blocked");
        }
        Ok(())
    }
}

impl SoundPlayer for RecordingPlayer {
    fn play_weapon_alert(&self) -> Result<()> {
        self.record(SoundCategory::Weapon)
    }

    fn play_generic_alert(&self) -> Result<()> {
        self.record(SoundCategory::Generic)
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Counts pause requests
#[derive(Clone, Default)]
pub struct CountingSurface {
    pub pauses: Arc<AtomicUsize>,
}

impl MediaSurface for CountingSurface {
    fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }
}

/// Simulated wall clock, milliseconds since an arbitrary origin
pub fn at(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap()
}

pub fn detection(class: &str) -> Detection {
    Detection {
        class: class.to_string(),
        confidence: 0.9,
        bbox: [1.0, 2.0, 3.0, 4.0],
        track_id: None,
    }
}

pub fn frame(frame_index: i64, classes: &[&str]) -> FrameEvent {
    FrameEvent {
        frame_index,
        timestamp: format!("00:00:{:02}", frame_index % 60),
        detections: classes.iter().map(|c| detection(c)).collect(),
        image: None,
    }
}

pub fn frame_with_image(frame_index: i64, classes: &[&str], jpeg: &[u8]) -> FrameEvent {
    use base64::Engine;
    let mut event = frame(frame_index, classes);
    event.image = Some(FrameImage::new(
        base64::engine::general_purpose::STANDARD.encode(jpeg),
    ));
    event
}

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use super::alert::{count_weapons, summarize_classes, Alert, AlertGate, CooldownState, SoundOutcome};
use super::capture::{AlertFrameQueue, AlertFrameWriter};
use super::config::SessionConfig;
use super::events::{
    CompletionEvent, ErrorEvent, FrameEvent, FrameImage, ProgressEvent, SessionStartedEvent,
};
use super::history::{HistoryEntry, RingHistory};
use super::progress::ProgressTracker;
use super::stats::{DetectionResult, LiveFrame, SessionSnapshot};
use crate::sound::{SoundCategory, SoundPlayer};
use crate::transport::ConnectionState;

/// Media playback surface owned outside the session (e.g. a video preview)
pub trait MediaSurface: Send {
    /// Pause any playback; best-effort
    fn pause(&self);
}

/// Surface with nothing to pause
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMediaSurface;

impl MediaSurface for NoMediaSurface {
    fn pause(&self) {}
}

/// All per-run state owned by the controller
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionState {
    pub processing: bool,
    pub progress: ProgressTracker,
    pub live_frame: Option<LiveFrame>,
    pub live_image: Option<FrameImage>,
    pub alert: Option<Alert>,
    pub last_alerted_frame: Option<i64>,
    pub history: RingHistory,
    pub result: Option<DetectionResult>,
    pub last_error: Option<String>,
    pub selected_input: Option<PathBuf>,
}

impl DetectionState {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            processing: false,
            progress: ProgressTracker::new(),
            live_frame: None,
            live_image: None,
            alert: None,
            last_alerted_frame: None,
            history: RingHistory::new(history_capacity),
            result: None,
            last_error: None,
            selected_input: None,
        }
    }
}

/// Owns one detection session and turns inbound events into observable state
pub struct SessionController {
    config: SessionConfig,
    state: DetectionState,
    gate: AlertGate,
    media: Box<dyn MediaSurface>,
    frame_queue: Option<AlertFrameQueue>,
}

impl SessionController {
    /// Create a controller with no external media surface
    pub fn new(config: SessionConfig, player: Box<dyn SoundPlayer>) -> Self {
        Self::with_media(config, player, Box::new(NoMediaSurface))
    }

    pub fn with_media(
        config: SessionConfig,
        player: Box<dyn SoundPlayer>,
        media: Box<dyn MediaSurface>,
    ) -> Self {
        info!("Creating detection session: {}", config.session_id);

        let mut gate = AlertGate::new(player, config.weapon_cooldown);
        gate.set_muted(config.muted);

        let frame_queue = config.alert_frames_dir.clone().and_then(|dir| {
            match AlertFrameWriter::new(dir, config.session_id.clone())
                .and_then(AlertFrameQueue::spawn)
            {
                Ok(queue) => Some(queue),
                Err(e) => {
                    warn!("Alert frame capture disabled: {:#}", e);
                    None
                }
            }
        });

        Self {
            state: DetectionState::new(config.history_capacity),
            config,
            gate,
            media,
            frame_queue,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    pub fn state(&self) -> &DetectionState {
        &self.state
    }

    pub fn cooldown_state(&self) -> CooldownState {
        self.gate.cooldown_state()
    }

    pub fn is_muted(&self) -> bool {
        self.gate.is_muted()
    }

    /// Last `n` history entries, most recent first
    pub fn recent_history(&self, n: usize) -> Vec<HistoryEntry> {
        self.state.history.recent(n)
    }

    /// Begin a run: clear per-run bookkeeping and mark processing
    pub fn start(&mut self) {
        if self.state.processing {
            warn!("Restarting local bookkeeping mid-run");
        }

        info!("Detection run started for session {}", self.config.session_id);

        self.state.processing = true;
        self.state.progress.reset();
        self.state.live_frame = None;
        self.state.live_image = None;
        self.state.alert = None;
        self.state.history.clear();
        self.state.last_alerted_frame = None;
    }

    /// Remote job accepted the session
    pub fn on_session_started(&mut self, event: SessionStartedEvent) {
        if let Some(filename) = &event.filename {
            debug!("Remote job processing {}", filename);
        }
        self.start();
    }

    /// Apply one analyzed frame
    pub fn on_frame(&mut self, frame: FrameEvent, now: DateTime<Utc>) {
        let detections_count = frame.detections.len();
        let weapon_count = count_weapons(&frame.detections, &self.config.weapon_keyword);

        // Live projection, always
        self.state.live_frame = Some(LiveFrame {
            frame_index: frame.frame_index,
            timestamp: frame.timestamp.clone(),
            detections_count,
        });
        if frame.image.is_some() {
            self.state.live_image = frame.image.clone();
        }

        if detections_count == 0 {
            return;
        }

        if self.state.last_alerted_frame != Some(frame.frame_index) {
            let alert = Alert {
                frame_index: frame.frame_index,
                timestamp: frame.timestamp.clone(),
                count: detections_count,
                class_summary: summarize_classes(&frame.detections),
                is_weapon_class: weapon_count > 0,
                weapon_count,
            };

            if alert.is_weapon_class {
                warn!(
                    "WEAPON DETECTED at frame {} [{}]: {} ({} weapon(s))",
                    alert.frame_index, alert.timestamp, alert.class_summary, weapon_count
                );
            } else {
                info!(
                    "Alert at frame {} [{}]: {} detection(s): {}",
                    alert.frame_index, alert.timestamp, alert.count, alert.class_summary
                );
            }

            self.state.alert = Some(alert);
            self.state.last_alerted_frame = Some(frame.frame_index);

            let category = if weapon_count > 0 {
                SoundCategory::Weapon
            } else {
                SoundCategory::Generic
            };
            let outcome = self.gate.request_sound(category, now);
            if outcome != SoundOutcome::Played {
                debug!("{:?} sound not played: {:?}", category, outcome);
            }

            self.capture_frame(&frame);
        }

        self.state.history.append(HistoryEntry {
            frame_index: frame.frame_index,
            timestamp: frame.timestamp,
            detections: frame.detections,
        });
    }

    fn capture_frame(&self, frame: &FrameEvent) {
        if let (Some(queue), Some(image)) = (&self.frame_queue, &frame.image) {
            queue.submit(frame.frame_index, image.clone());
        }
    }

    /// Coarse progress, clamped below completion
    pub fn on_progress(&mut self, event: ProgressEvent) {
        self.state.progress.set(event.percent);
        debug!(
            "Progress {}% (reported {:.1})",
            self.state.progress.percent(),
            event.percent
        );
    }

    /// Remote job finished
    pub fn on_complete(&mut self, event: CompletionEvent) {
        let result_url = event
            .result_path
            .as_deref()
            .map(|path| join_url(&self.config.api_base_url, path));

        info!(
            "Processing complete for session {}: {}",
            self.config.session_id,
            result_url.as_deref().unwrap_or("<no result path>")
        );

        self.state.result = Some(DetectionResult {
            result_path: event.result_path,
            result_url,
            unique_tracks: event.unique_tracks,
        });
        self.state.processing = false;
        self.state.live_image = None;
        self.state.progress.force_complete();
    }

    /// Remote job reported a failure; stored verbatim
    pub fn on_error(&mut self, event: ErrorEvent) {
        error!("Processing error: {}", event.message);
        self.state.last_error = Some(event.message);
    }

    /// Drop all per-run state and pause external playback
    pub fn reset(&mut self) {
        info!("Resetting session {}", self.config.session_id);

        self.state = DetectionState::new(self.config.history_capacity);
        self.gate.reset();
        self.media.pause();
    }

    pub fn set_muted(&mut self, muted: bool) {
        info!("Alert sounds {}", if muted { "muted" } else { "unmuted" });
        self.gate.set_muted(muted);
    }

    pub fn toggle_mute(&mut self) -> bool {
        let muted = !self.gate.is_muted();
        self.set_muted(muted);
        muted
    }

    /// Record the media file chosen for upload
    pub fn select_input(&mut self, path: PathBuf) {
        debug!("Selected input {:?}", path);
        self.state.selected_input = Some(path);
    }

    /// Observable state for the presentation layer
    pub fn snapshot(&self, connection: ConnectionState, joined: bool) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.config.session_id.clone(),
            connection,
            joined,
            processing: self.state.processing,
            muted: self.gate.is_muted(),
            progress_percent: self.state.progress.percent(),
            live_frame: self.state.live_frame.clone(),
            live_image: self.state.live_image.clone(),
            alert: self.state.alert.clone(),
            result: self.state.result.clone(),
            last_error: self.state.last_error.clone(),
            selected_input: self.state.selected_input.clone(),
            history_len: self.state.history.len(),
        }
    }
}

fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("http://localhost:5000", "/api/detect/results/video/a.webm"),
            "http://localhost:5000/api/detect/results/video/a.webm"
        );
        assert_eq!(join_url("http://host/", "x.webm"), "http://host/x.webm");
        assert_eq!(
            join_url("http://host", "https://cdn.example.org/x.webm"),
            "https://cdn.example.org/x.webm"
        );
    }
}

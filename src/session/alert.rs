use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::events::Detection;
use crate::sound::{SoundCategory, SoundPlayer};

/// Number of classes listed in an alert summary
const SUMMARY_TOP_CLASSES: usize = 5;

/// User-facing notification for a frame with detections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub frame_index: i64,
    pub timestamp: String,
    /// Total detections in the frame
    pub count: usize,
    /// e.g. "knife(2), handgun(1)"
    pub class_summary: String,
    pub is_weapon_class: bool,
    pub weapon_count: usize,
}

/// Weapon sound cooldown bookkeeping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownState {
    pub last_weapon_sound_at: Option<DateTime<Utc>>,
}

/// What happened to a sound request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundOutcome {
    Played,
    Muted,
    CoolingDown,
    /// Backend refused the request; ignored
    Failed,
}

/// Count detections whose class contains `keyword`, case-insensitively
pub fn count_weapons(detections: &[Detection], keyword: &str) -> usize {
    let keyword = keyword.to_lowercase();
    detections
        .iter()
        .filter(|d| d.class.to_lowercase().contains(&keyword))
        .count()
}

/// Top classes by count, ties in first-seen order, as "label(n), ..."
pub fn summarize_classes(detections: &[Detection]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for detection in detections {
        match counts.iter_mut().find(|(label, _)| *label == detection.class) {
            Some((_, n)) => *n += 1,
            None => counts.push((detection.class.as_str(), 1)),
        }
    }

    // Stable sort keeps first-occurrence order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    counts
        .into_iter()
        .take(SUMMARY_TOP_CLASSES)
        .map(|(label, n)| format!("{}({})", label, n))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Decides whether an alert plays a sound
///
/// The weapon channel is cooldown-gated; the generic channel only honours
/// the mute flag.
pub struct AlertGate {
    player: Box<dyn SoundPlayer>,
    cooldown: Duration,
    muted: bool,
    state: CooldownState,
}

impl AlertGate {
    pub fn new(player: Box<dyn SoundPlayer>, cooldown: Duration) -> Self {
        Self {
            player,
            cooldown,
            muted: false,
            state: CooldownState::default(),
        }
    }

    pub fn request_sound(&mut self, category: SoundCategory, now: DateTime<Utc>) -> SoundOutcome {
        if self.muted {
            return SoundOutcome::Muted;
        }

        let result = match category {
            SoundCategory::Weapon => {
                if !self.weapon_window_open(now) {
                    debug!("Weapon sound suppressed by cooldown");
                    return SoundOutcome::CoolingDown;
                }
                self.state.last_weapon_sound_at = Some(now);
                self.player.play_weapon_alert()
            }
            SoundCategory::Generic => self.player.play_generic_alert(),
        };

        match result {
            Ok(()) => SoundOutcome::Played,
            Err(e) => {
                debug!("Ignoring {} playback failure: {:#}", self.player.name(), e);
                SoundOutcome::Failed
            }
        }
    }

    fn weapon_window_open(&self, now: DateTime<Utc>) -> bool {
        match self.state.last_weapon_sound_at {
            None => true,
            Some(last) => {
                let elapsed_ms = now.signed_duration_since(last).num_milliseconds();
                elapsed_ms > self.cooldown.as_millis() as i64
            }
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn cooldown_state(&self) -> CooldownState {
        self.state
    }

    /// Forget the last weapon sound; mute is kept
    pub fn reset(&mut self) {
        self.state = CooldownState::default();
    }
}

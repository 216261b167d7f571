//! Live detection session management
//!
//! This module provides the `SessionController` and the pieces around it:
//! - Event classification and the room join lifecycle (`EventRouter`)
//! - Bounded frame history (`RingHistory`)
//! - Alert de-duplication and sound cooldown (`AlertGate`)
//! - Displayed progress (`ProgressTracker`)
//! - The single-owner event loop (`SessionRunner`)

mod alert;
mod capture;
mod config;
mod controller;
mod events;
mod history;
mod progress;
mod router;
mod runner;
mod stats;

pub use alert::{count_weapons, summarize_classes, Alert, AlertGate, CooldownState, SoundOutcome};
pub use capture::{AlertFrameQueue, AlertFrameWriter};
pub use config::SessionConfig;
pub use controller::{DetectionState, MediaSurface, NoMediaSurface, SessionController};
pub use events::{
    CompletionEvent, Detection, ErrorEvent, FrameEvent, FrameImage, InboundEvent, ProgressEvent,
    SessionStartedEvent,
};
pub use history::{HistoryEntry, RingHistory, DEFAULT_HISTORY_CAPACITY};
pub use progress::{ProgressTracker, MAX_LIVE_PERCENT};
pub use router::{
    EventRouter, EVENT_COMPLETE, EVENT_ERROR, EVENT_FRAME, EVENT_PROGRESS, EVENT_STARTED,
};
pub use runner::{SessionCommand, SessionHandle, SessionRunner};
pub use stats::{DetectionResult, LiveFrame, SessionSnapshot};

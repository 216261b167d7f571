use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use super::controller::SessionController;
use super::events::InboundEvent;
use crate::transport::messages::{
    CompleteMessage, ErrorMessage, FrameDetectionMessage, ProgressMessage, StartedMessage,
};
use crate::transport::{ConnectionState, OutboundCommand};

pub const EVENT_STARTED: &str = "video_processing_started";
pub const EVENT_FRAME: &str = "frame_detection";
pub const EVENT_PROGRESS: &str = "video_processing_progress";
pub const EVENT_COMPLETE: &str = "video_processing_complete";
pub const EVENT_ERROR: &str = "video_processing_error";

/// Server chatter that is logged but never affects detection state
const AUXILIARY_EVENTS: [&str; 4] = ["server_message", "pong_client", "broadcast_msg", "room_msg"];

/// Classifies transport messages and owns the join lifecycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventRouter {
    connection: ConnectionState,
    joined: bool,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn is_joined(&self) -> bool {
        self.joined
    }

    /// Apply a connection state change
    ///
    /// Returns the join command to send, at most once per connected interval.
    /// Only a disconnect re-arms the join.
    pub fn on_connection_state(
        &mut self,
        next: ConnectionState,
        session_id: &str,
    ) -> Option<OutboundCommand> {
        if next != self.connection {
            info!("Connection {:?} -> {:?}", self.connection, next);
        }
        self.connection = next;

        match next {
            ConnectionState::Connected if !self.joined => {
                self.joined = true;
                info!("Joining room {}", session_id);
                Some(OutboundCommand::Join {
                    room: session_id.to_string(),
                })
            }
            ConnectionState::Disconnected => {
                self.joined = false;
                None
            }
            _ => None,
        }
    }

    /// Turn a named server event into a typed event
    ///
    /// Unknown names and payloads of the wrong shape become `Other`.
    pub fn classify(name: &str, payload: Value) -> InboundEvent {
        let parsed = match name {
            EVENT_STARTED => {
                // The started payload carries only job metadata; any shape is accepted
                let started: StartedMessage =
                    serde_json::from_value(payload).unwrap_or_default();
                return InboundEvent::SessionStarted(started.into());
            }
            EVENT_FRAME => parse::<FrameDetectionMessage>(name, payload)
                .map(|msg| InboundEvent::Frame(msg.into())),
            EVENT_PROGRESS => parse::<ProgressMessage>(name, payload)
                .map(|msg| InboundEvent::Progress(msg.into())),
            EVENT_COMPLETE => parse::<CompleteMessage>(name, payload)
                .map(|msg| InboundEvent::Complete(msg.into())),
            EVENT_ERROR => {
                parse::<ErrorMessage>(name, payload).map(|msg| InboundEvent::Error(msg.into()))
            }
            _ => {
                if AUXILIARY_EVENTS.contains(&name) {
                    let text = payload
                        .get("text")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| payload.to_string());
                    info!("{}: {}", name, text);
                } else {
                    debug!("Ignoring unknown event {}", name);
                }
                None
            }
        };

        parsed.unwrap_or_else(|| InboundEvent::Other {
            name: name.to_string(),
        })
    }

    /// Forward a typed event to the controller
    pub fn dispatch(&self, controller: &mut SessionController, event: InboundEvent, now: DateTime<Utc>) {
        match event {
            InboundEvent::SessionStarted(started) => controller.on_session_started(started),
            InboundEvent::Frame(frame) => controller.on_frame(frame, now),
            InboundEvent::Progress(progress) => controller.on_progress(progress),
            InboundEvent::Complete(complete) => controller.on_complete(complete),
            InboundEvent::Error(error) => controller.on_error(error),
            InboundEvent::Other { .. } => {}
        }
    }

    /// Classify and dispatch in one step
    pub fn route(
        &self,
        controller: &mut SessionController,
        name: &str,
        payload: Value,
        now: DateTime<Utc>,
    ) {
        let event = Self::classify(name, payload);
        self.dispatch(controller, event, now);
    }
}

fn parse<T: DeserializeOwned>(name: &str, payload: Value) -> Option<T> {
    match serde_json::from_value(payload) {
        Ok(msg) => Some(msg),
        Err(e) => {
            debug!("Dropping malformed {} payload: {}", name, e);
            None
        }
    }
}

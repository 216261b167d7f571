//! HTTP API for the presentation layer
//!
//! This module exposes the running session over a local REST API:
//! - GET /session - Observable session state
//! - GET /session/history?limit=N - Recent frames with detections
//! - GET /session/frame.jpg - Latest streamed frame
//! - POST /session/start - Begin local bookkeeping for a run
//! - POST /session/reset - Clear all per-run state
//! - POST /session/mute - Set or toggle alert sounds
//! - POST /session/input - Record the media file chosen for upload
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;

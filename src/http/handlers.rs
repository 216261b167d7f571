use super::state::AppState;
use crate::session::{SessionCommand, SessionSnapshot};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{error, info};

/// Default number of history entries returned
const DEFAULT_HISTORY_LIMIT: usize = 30;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Number of entries, newest first (default: 30)
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct MuteRequest {
    /// Explicit state; toggles when absent
    pub muted: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SelectInputRequest {
    pub path: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub status: String,
    pub message: String,
    /// State after the command was applied
    pub session: SessionSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

async fn send_command(state: &AppState, command: SessionCommand, message: &str) -> Response {
    match state.session.apply(command).await {
        Ok(session) => (
            StatusCode::OK,
            Json(CommandResponse {
                status: "ok".to_string(),
                message: message.to_string(),
                session,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to apply session command: {:#}", e);
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Session unavailable: {}", e),
            )
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /session
/// Current observable state
pub async fn get_session(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.session.snapshot()))
}

/// GET /session/history?limit=N
/// Most recent frames with detections, newest first
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);

    match state.session.history(limit).await {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(e) => {
            error!("Failed to read history: {:#}", e);
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Failed to read history: {}", e),
            )
        }
    }
}

/// GET /session/frame.jpg
/// Latest streamed frame as JPEG
pub async fn get_live_frame(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.session.snapshot();

    let Some(image) = snapshot.live_image else {
        return error_response(StatusCode::NOT_FOUND, "No live frame".to_string());
    };

    match image.decode() {
        Ok(bytes) => (StatusCode::OK, [(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response(),
        Err(e) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Live frame is unreadable: {}", e),
        ),
    }
}

/// POST /session/start
pub async fn start_session(State(state): State<AppState>) -> impl IntoResponse {
    info!("Start requested over HTTP");
    send_command(&state, SessionCommand::Start, "Detection run started").await
}

/// POST /session/reset
pub async fn reset_session(State(state): State<AppState>) -> impl IntoResponse {
    info!("Reset requested over HTTP");
    send_command(&state, SessionCommand::Reset, "Session reset").await
}

/// POST /session/mute
/// Body `{"muted": bool}` sets the flag; an empty body toggles it
pub async fn set_mute(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let request = if body.is_empty() {
        MuteRequest { muted: None }
    } else {
        match serde_json::from_slice::<MuteRequest>(&body) {
            Ok(req) => req,
            Err(e) => {
                return error_response(StatusCode::BAD_REQUEST, format!("Invalid body: {}", e))
            }
        }
    };

    let command = match request.muted {
        Some(muted) => SessionCommand::SetMuted(muted),
        None => SessionCommand::ToggleMute,
    };

    send_command(&state, command, "Mute updated").await
}

/// POST /session/input
pub async fn select_input(
    State(state): State<AppState>,
    Json(req): Json<SelectInputRequest>,
) -> impl IntoResponse {
    send_command(&state, SessionCommand::SelectInput(req.path), "Input selected").await
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

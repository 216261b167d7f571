use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session queries
        .route("/session", get(handlers::get_session))
        .route("/session/history", get(handlers::get_history))
        .route("/session/frame.jpg", get(handlers::get_live_frame))
        // Session control
        .route("/session/start", post(handlers::start_session))
        .route("/session/reset", post(handlers::reset_session))
        .route("/session/mute", post(handlers::set_mute))
        .route("/session/input", post(handlers::select_input))
        // Browser dashboards poll from another origin
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

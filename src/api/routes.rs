use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", progress_routes())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        // outermost, so the id exists before the trace span is created
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

fn progress_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/:user_id/progress",
            get(handlers::list_progress).post(handlers::initialize),
        )
        .route(
            "/users/:user_id/progress/:show_id",
            get(handlers::get_progress).delete(handlers::remove_progress),
        )
        // Transitions
        .route(
            "/users/:user_id/progress/:show_id/episodes",
            post(handlers::toggle_episode),
        )
        .route(
            "/users/:user_id/progress/:show_id/seasons/:season/toggle",
            post(handlers::toggle_season),
        )
        .route(
            "/users/:user_id/progress/:show_id/complete",
            post(handlers::complete),
        )
        .route(
            "/users/:user_id/progress/:show_id/resume",
            post(handlers::resume),
        )
        .route(
            "/users/:user_id/progress/:show_id/drop",
            post(handlers::drop_show),
        )
        // Metadata
        .route(
            "/users/:user_id/progress/:show_id/refresh",
            post(handlers::refresh),
        )
        .route(
            "/users/:user_id/progress/:show_id/stats",
            get(handlers::stats),
        )
}

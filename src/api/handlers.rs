use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{ProgressStats, ShowId, ShowProgress, ShowSummary, WatchStatus},
    services::{tracked_shows, RefreshOutcome},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<WatchStatus>,
}

#[derive(Debug, Deserialize)]
pub struct InitializeRequest {
    pub show_id: ShowId,
    /// Looked up from the metadata provider when absent
    pub summary: Option<ShowSummary>,
}

#[derive(Debug, Serialize)]
pub struct InitializeResponse {
    pub progress: ShowProgress,
    pub removed_from_watchlist: bool,
}

#[derive(Debug, Deserialize)]
pub struct ToggleEpisodeRequest {
    pub season: u32,
    pub episode: u32,
}

// Helpers

async fn load_progress(state: &AppState, user_id: &str, show_id: ShowId) -> AppResult<ShowProgress> {
    state
        .store
        .get_record(user_id, show_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("show {} is not tracked by user {}", show_id, user_id))
        })
}

/// Writes the whole record back and echoes it
async fn persist(state: &AppState, user_id: &str, progress: ShowProgress) -> AppResult<Json<ShowProgress>> {
    state.store.put_record(user_id, &progress).await.inspect_err(|e| {
        tracing::error!(user_id = %user_id, show_id = progress.show_id, error = %e, "Failed to persist progress")
    })?;
    Ok(Json(progress))
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// List a user's tracked shows, most recently watched first
pub async fn list_progress(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<ShowProgress>>> {
    let records = state.store.list_records(&user_id).await?;
    Ok(Json(tracked_shows(records, query.status)))
}

/// Start tracking a show and take it off the watchlist
pub async fn initialize(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<InitializeRequest>,
) -> AppResult<(StatusCode, Json<InitializeResponse>)> {
    let summary = match request.summary {
        Some(summary) if summary.id != request.show_id => {
            return Err(AppError::InvalidInput(format!(
                "summary is for show {}, not {}",
                summary.id, request.show_id
            )));
        }
        Some(summary) => summary,
        None => state.tracker.fetch_show_summary(request.show_id).await?,
    };

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        show_id = request.show_id,
        seasons = summary.total_seasons,
        "Initializing progress tracking"
    );

    let progress = state.tracker.initialize(&user_id, summary).await?;

    let removed_from_watchlist = match state
        .store
        .remove_watchlist_entry(&user_id, progress.show_id)
        .await
    {
        Ok(removed) => removed,
        Err(e) => {
            tracing::warn!(
                request_id = %request_id,
                show_id = progress.show_id,
                error = %e,
                "Tracking started but watchlist entry could not be removed"
            );
            false
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(InitializeResponse {
            progress,
            removed_from_watchlist,
        }),
    ))
}

/// Get one tracked show
pub async fn get_progress(
    State(state): State<AppState>,
    Path((user_id, show_id)): Path<(String, ShowId)>,
) -> AppResult<Json<ShowProgress>> {
    Ok(Json(load_progress(&state, &user_id, show_id).await?))
}

/// Stop tracking a show
pub async fn remove_progress(
    State(state): State<AppState>,
    Path((user_id, show_id)): Path<(String, ShowId)>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<StatusCode> {
    tracing::info!(request_id = %request_id, user_id = %user_id, show_id, "Removing tracked show");
    state.tracker.remove(&user_id, show_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Toggle a single episode
pub async fn toggle_episode(
    State(state): State<AppState>,
    Path((user_id, show_id)): Path<(String, ShowId)>,
    Json(request): Json<ToggleEpisodeRequest>,
) -> AppResult<Json<ShowProgress>> {
    let progress = load_progress(&state, &user_id, show_id).await?;
    let next = state
        .tracker
        .toggle_episode(&progress, request.season, request.episode)?;
    persist(&state, &user_id, next).await
}

/// Toggle every episode of a season
pub async fn toggle_season(
    State(state): State<AppState>,
    Path((user_id, show_id, season)): Path<(String, ShowId, u32)>,
) -> AppResult<Json<ShowProgress>> {
    let progress = load_progress(&state, &user_id, show_id).await?;
    let next = state.tracker.toggle_season(&progress, season)?;
    persist(&state, &user_id, next).await
}

/// Mark every episode watched and the show completed
pub async fn complete(
    State(state): State<AppState>,
    Path((user_id, show_id)): Path<(String, ShowId)>,
) -> AppResult<Json<ShowProgress>> {
    let progress = load_progress(&state, &user_id, show_id).await?;
    let next = state.tracker.mark_show_completed(&progress)?;
    persist(&state, &user_id, next).await
}

/// Return a show to active tracking
pub async fn resume(
    State(state): State<AppState>,
    Path((user_id, show_id)): Path<(String, ShowId)>,
) -> AppResult<Json<ShowProgress>> {
    let progress = load_progress(&state, &user_id, show_id).await?;
    persist(&state, &user_id, state.tracker.mark_show_watching(&progress)).await
}

/// Drop a show from active tracking
pub async fn drop_show(
    State(state): State<AppState>,
    Path((user_id, show_id)): Path<(String, ShowId)>,
) -> AppResult<Json<ShowProgress>> {
    let progress = load_progress(&state, &user_id, show_id).await?;
    persist(&state, &user_id, state.tracker.mark_show_dropped(&progress)).await
}

/// Re-fetch season lengths from the metadata provider
pub async fn refresh(
    State(state): State<AppState>,
    Path((user_id, show_id)): Path<(String, ShowId)>,
) -> AppResult<Json<RefreshOutcome>> {
    let progress = load_progress(&state, &user_id, show_id).await?;
    let outcome = state.tracker.refresh_season_totals(&progress).await?;
    state.store.put_record(&user_id, &outcome.progress).await?;
    Ok(Json(outcome))
}

/// Watched/total counts for a show
pub async fn stats(
    State(state): State<AppState>,
    Path((user_id, show_id)): Path<(String, ShowId)>,
) -> AppResult<Json<ProgressStats>> {
    let progress = load_progress(&state, &user_id, show_id).await?;
    Ok(Json(progress.stats()))
}

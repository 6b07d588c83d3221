//! Pure state transitions for show progress records
//!
//! Every function takes the current record by reference and returns a new
//! record, leaving the input untouched. A rejected transition returns an
//! error and the caller keeps its original value. Persisting the result is
//! the caller's job, as a single whole-document write.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::{
    error::{AppError, AppResult},
    models::{CountSource, SeasonProgress, ShowProgress, WatchStatus},
};

/// Toggles one episode between watched and unwatched
///
/// A season missing from the record is created on the spot with
/// `fallback_total` episodes and flagged as degraded. A completed show that
/// is no longer fully watched afterwards is demoted to watching, whether the
/// toggle unwatched an episode or opened a new season.
pub fn toggle_episode(
    progress: &ShowProgress,
    season: u32,
    episode: u32,
    fallback_total: u32,
    now: DateTime<Utc>,
) -> AppResult<ShowProgress> {
    progress.check_invariants()?;
    if season == 0 || episode == 0 {
        return Err(AppError::InvariantViolation(format!(
            "S{}E{} is not a valid episode; seasons and episodes start at 1",
            season, episode
        )));
    }

    let mut next = progress.clone();
    let entry = season_entry(&mut next, season, fallback_total);

    let removed = if entry.episodes_watched.remove(&episode) {
        true
    } else {
        if episode > entry.total_episodes {
            return Err(AppError::InvariantViolation(format!(
                "show {} season {} has {} episodes, cannot mark episode {}",
                progress.show_id, season, entry.total_episodes, episode
            )));
        }
        entry.episodes_watched.insert(episode);
        false
    };

    demote_if_incomplete(&mut next);
    next.current_position = next.derive_position();
    next.last_watched = now;

    tracing::debug!(
        show_id = next.show_id,
        season,
        episode,
        watched = !removed,
        position = %next.current_position,
        "Toggled episode"
    );

    Ok(next)
}

/// Toggles a whole season
///
/// A season counts as complete when its watched count equals its total. A
/// complete season is emptied, an incomplete one is filled with
/// `1..=total_episodes`. A completed show left with unwatched episodes is
/// demoted to watching.
pub fn toggle_season(
    progress: &ShowProgress,
    season: u32,
    fallback_total: u32,
    now: DateTime<Utc>,
) -> AppResult<ShowProgress> {
    progress.check_invariants()?;
    if season == 0 {
        return Err(AppError::InvariantViolation(
            "season 0 is not a valid season; seasons start at 1".to_string(),
        ));
    }

    let mut next = progress.clone();
    let entry = season_entry(&mut next, season, fallback_total);

    let was_complete = entry.is_complete();
    if was_complete {
        entry.clear();
    } else {
        entry.fill();
    }

    demote_if_incomplete(&mut next);
    next.current_position = next.derive_position();
    next.last_watched = now;

    tracing::debug!(
        show_id = next.show_id,
        season,
        watched = !was_complete,
        position = %next.current_position,
        "Toggled season"
    );

    Ok(next)
}

/// Marks every tracked season fully watched and the show completed
pub fn mark_show_completed(progress: &ShowProgress, now: DateTime<Utc>) -> AppResult<ShowProgress> {
    progress.check_invariants()?;

    let mut next = progress.clone();
    next.seasons.values_mut().for_each(SeasonProgress::fill);
    next.current_position = next.derive_position();
    next.status = WatchStatus::Completed;
    next.last_watched = now;

    Ok(next)
}

/// Puts the show back into active tracking, keeping its watched history
pub fn mark_show_watching(progress: &ShowProgress, now: DateTime<Utc>) -> ShowProgress {
    with_status(progress, WatchStatus::Watching, now)
}

/// Moves the show off the active tracker, keeping its watched history
pub fn mark_show_dropped(progress: &ShowProgress, now: DateTime<Utc>) -> ShowProgress {
    with_status(progress, WatchStatus::Dropped, now)
}

/// Overwrites season totals with freshly fetched counts
///
/// Watched sets are never modified. Seasons missing from the record are
/// created. A fetched count below the highest watched episode is raised to
/// that episode so the watched set stays in range. A completed show that
/// gained episodes is demoted to watching. `last_watched` is left alone.
pub fn apply_season_totals(
    progress: &ShowProgress,
    fetched: &BTreeMap<u32, u32>,
) -> AppResult<ShowProgress> {
    progress.check_invariants()?;

    let mut next = progress.clone();

    for (&number, &count) in fetched {
        let season = next
            .seasons
            .entry(number)
            .or_insert_with(|| SeasonProgress::provided(count));

        let highest_watched = season.last_watched_episode().unwrap_or(0);
        if count < highest_watched {
            tracing::warn!(
                show_id = progress.show_id,
                season = number,
                fetched = count,
                highest_watched,
                "Provider reports fewer episodes than already watched, keeping watched range"
            );
        }

        season.total_episodes = count.max(highest_watched);
        season.count_source = CountSource::Provider;
    }

    if demote_if_incomplete(&mut next) {
        tracing::info!(
            show_id = next.show_id,
            "New episodes found for completed show, moving back to watching"
        );
    }

    Ok(next)
}

fn season_entry(progress: &mut ShowProgress, season: u32, fallback_total: u32) -> &mut SeasonProgress {
    let show_id = progress.show_id;
    progress.seasons.entry(season).or_insert_with(|| {
        tracing::warn!(
            show_id,
            season,
            fallback_total,
            "Season missing from progress record, created with fallback episode count"
        );
        SeasonProgress::fallback(fallback_total)
    })
}

/// Returns whether the show was demoted
fn demote_if_incomplete(progress: &mut ShowProgress) -> bool {
    if progress.status == WatchStatus::Completed && !progress.is_fully_watched() {
        progress.status = WatchStatus::Watching;
        return true;
    }
    false
}

fn with_status(progress: &ShowProgress, status: WatchStatus, now: DateTime<Utc>) -> ShowProgress {
    let mut next = progress.clone();
    next.status = status;
    next.last_watched = now;
    next
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
};

use crate::error::{AppError, AppResult};

/// Stable TMDB identifier of a tracked show
pub type ShowId = u64;

/// Episode count used when the provider cannot tell us how long a season is
pub const DEFAULT_FALLBACK_EPISODE_COUNT: u32 = 10;

/// Upper bound on the season count of a tracked show; each season costs one
/// provider lookup on initialize and refresh
pub const MAX_SEASONS: u32 = 200;

/// Tracking state of a show on a user's tracker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchStatus {
    #[default]
    Watching,
    Completed,
    Dropped,
}

impl Display for WatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchStatus::Watching => write!(f, "watching"),
            WatchStatus::Completed => write!(f, "completed"),
            WatchStatus::Dropped => write!(f, "dropped"),
        }
    }
}

/// A (season, episode) pair. Ordering is lexicographic: season first, then episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EpisodePosition {
    pub season: u32,
    pub episode: u32,
}

impl EpisodePosition {
    /// Bookmark of a show with nothing watched
    pub const START: EpisodePosition = EpisodePosition {
        season: 1,
        episode: 1,
    };

    pub fn new(season: u32, episode: u32) -> Self {
        Self { season, episode }
    }
}

impl Display for EpisodePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{}E{}", self.season, self.episode)
    }
}

/// Where a season's episode count came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountSource {
    /// Confirmed by the metadata provider
    #[default]
    Provider,
    /// Substituted default after a failed or skipped lookup (degraded mode)
    Fallback,
}

/// Watch progress within one season
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonProgress {
    /// Watched episode numbers, ascending, no duplicates
    pub episodes_watched: BTreeSet<u32>,
    pub total_episodes: u32,
    #[serde(default)]
    pub count_source: CountSource,
}

impl SeasonProgress {
    /// Empty season whose length was confirmed by the provider
    pub fn provided(total_episodes: u32) -> Self {
        Self {
            episodes_watched: BTreeSet::new(),
            total_episodes,
            count_source: CountSource::Provider,
        }
    }

    /// Empty season running on the fallback episode count
    pub fn fallback(total_episodes: u32) -> Self {
        Self {
            episodes_watched: BTreeSet::new(),
            total_episodes,
            count_source: CountSource::Fallback,
        }
    }

    pub fn watched_count(&self) -> u32 {
        self.episodes_watched.len() as u32
    }

    /// Completeness is decided by count, not by membership.
    pub fn is_complete(&self) -> bool {
        self.watched_count() == self.total_episodes
    }

    pub fn is_degraded(&self) -> bool {
        self.count_source == CountSource::Fallback
    }

    pub fn last_watched_episode(&self) -> Option<u32> {
        self.episodes_watched.last().copied()
    }

    /// Marks every episode `1..=total_episodes` as watched
    pub fn fill(&mut self) {
        self.episodes_watched = (1..=self.total_episodes).collect();
    }

    /// Unmarks every episode, returning how many were removed
    pub fn clear(&mut self) -> usize {
        let removed = self.episodes_watched.len();
        self.episodes_watched.clear();
        removed
    }
}

/// Display data captured when tracking starts. Never re-derived automatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowSummary {
    pub id: ShowId,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    pub total_seasons: u32,
    pub total_episodes: u32,
}

/// A user's watch progress for one show, persisted as a single document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowProgress {
    pub show_id: ShowId,
    pub show_summary: ShowSummary,
    /// Latest watched episode across all seasons, or S1E1 when nothing is watched
    pub current_position: EpisodePosition,
    pub status: WatchStatus,
    pub last_watched: DateTime<Utc>,
    pub seasons: BTreeMap<u32, SeasonProgress>,
}

impl ShowProgress {
    /// Fresh record: watching, bookmark at S1E1, nothing watched
    pub fn new(
        show_summary: ShowSummary,
        seasons: BTreeMap<u32, SeasonProgress>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            show_id: show_summary.id,
            show_summary,
            current_position: EpisodePosition::START,
            status: WatchStatus::Watching,
            last_watched: now,
            seasons,
        }
    }

    /// Lexicographic maximum of all watched (season, episode) pairs
    pub fn latest_watched(&self) -> Option<EpisodePosition> {
        self.seasons.iter().rev().find_map(|(season, progress)| {
            progress
                .last_watched_episode()
                .map(|episode| EpisodePosition::new(*season, episode))
        })
    }

    /// The bookmark implied by the watched sets
    pub fn derive_position(&self) -> EpisodePosition {
        self.latest_watched().unwrap_or(EpisodePosition::START)
    }

    /// True when every tracked season has all of its episodes watched
    pub fn is_fully_watched(&self) -> bool {
        self.seasons.values().all(SeasonProgress::is_complete)
    }

    /// Season numbers whose episode count is a fallback default
    pub fn degraded_seasons(&self) -> Vec<u32> {
        self.seasons
            .iter()
            .filter(|(_, season)| season.is_degraded())
            .map(|(number, _)| *number)
            .collect()
    }

    /// Validates the record-level invariants
    ///
    /// Returns the first violation found:
    /// - season keys are 1-based
    /// - every watched episode lies in `1..=total_episodes`
    /// - `current_position` is the latest watched episode (or S1E1)
    /// - a completed show has every season fully watched
    pub fn check_invariants(&self) -> AppResult<()> {
        for (number, season) in &self.seasons {
            if *number == 0 {
                return Err(AppError::InvariantViolation(format!(
                    "show {} has a season numbered 0",
                    self.show_id
                )));
            }

            let out_of_range = season
                .episodes_watched
                .iter()
                .find(|episode| **episode == 0 || **episode > season.total_episodes);

            if let Some(episode) = out_of_range {
                return Err(AppError::InvariantViolation(format!(
                    "show {} season {}: episode {} outside 1..={}",
                    self.show_id, number, episode, season.total_episodes
                )));
            }
        }

        let expected = self.derive_position();
        if self.current_position != expected {
            return Err(AppError::InvariantViolation(format!(
                "show {}: bookmark {} but latest watched is {}",
                self.show_id, self.current_position, expected
            )));
        }

        if self.status == WatchStatus::Completed && !self.is_fully_watched() {
            return Err(AppError::InvariantViolation(format!(
                "show {} is completed but not fully watched",
                self.show_id
            )));
        }

        Ok(())
    }

    /// Aggregate progress, derived on read
    pub fn stats(&self) -> ProgressStats {
        let watched = self.seasons.values().map(SeasonProgress::watched_count).sum();
        let total = self.seasons.values().map(|s| s.total_episodes).sum();

        let season_number = self.current_position.season;
        let current_season = match self.seasons.get(&season_number) {
            Some(season) => SeasonStats {
                season: season_number,
                watched: season.watched_count(),
                total: season.total_episodes,
                percentage: percentage(season.watched_count(), season.total_episodes),
            },
            None => SeasonStats {
                season: season_number,
                watched: 0,
                total: 0,
                percentage: 0,
            },
        };

        ProgressStats {
            show_id: self.show_id,
            status: self.status,
            current_position: self.current_position,
            watched,
            total,
            percentage: percentage(watched, total),
            current_season,
        }
    }
}

fn percentage(watched: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(watched) / f64::from(total) * 100.0).round() as u32
}

/// Watched/total counts across the whole show
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressStats {
    pub show_id: ShowId,
    pub status: WatchStatus,
    pub current_position: EpisodePosition,
    pub watched: u32,
    pub total: u32,
    pub percentage: u32,
    pub current_season: SeasonStats,
}

/// Watched/total counts for the season holding the bookmark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonStats {
    pub season: u32,
    pub watched: u32,
    pub total: u32,
    pub percentage: u32,
}

//! Domain and provider data types

pub mod progress;
pub mod tmdb;

pub use progress::{
    CountSource, EpisodePosition, ProgressStats, SeasonProgress, SeasonStats, ShowId,
    ShowProgress, ShowSummary, WatchStatus, DEFAULT_FALLBACK_EPISODE_COUNT,
    MAX_SEASONS,
};
pub use tmdb::{TmdbEpisode, TmdbSeasonDetails, TmdbTvDetails};

//! Show metadata provider abstraction
//!
//! The tracker only needs two facts from the outside world: what a show is
//! (title, poster, season count) and how many episodes a season has. Any
//! metadata source that can answer both can back the tracker.

use crate::{
    error::ProviderResult,
    models::{ShowId, ShowSummary},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Trait for show metadata providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch display data and the season count of a show
    async fn get_show_summary(&self, show_id: ShowId) -> ProviderResult<ShowSummary>;

    /// Fetch the number of episodes in one season of a show
    async fn get_season_episode_count(
        &self,
        show_id: ShowId,
        season_number: u32,
    ) -> ProviderResult<u32>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

use chrono::Utc;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::{
    db::ProgressStore,
    error::{AppError, AppResult},
    models::{SeasonProgress, ShowId, ShowProgress, ShowSummary, WatchStatus, MAX_SEASONS},
    services::{providers::MetadataProvider, transitions},
};

/// Result of re-fetching season lengths for a record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshOutcome {
    pub progress: ShowProgress,
    /// Seasons whose lookup failed; their previous totals were kept
    pub failed_seasons: Vec<u32>,
}

/// Owns the watch-progress lifecycle of tracked shows
///
/// Record-mutating operations are pure: they take the caller's current
/// record and hand back the next one, which the caller persists with a
/// single `put_record`. Only `initialize` and `remove` touch the store
/// themselves.
#[derive(Clone)]
pub struct ProgressTracker {
    provider: Arc<dyn MetadataProvider>,
    store: Arc<dyn ProgressStore>,
    fallback_episode_count: u32,
}

impl ProgressTracker {
    pub fn new(
        provider: Arc<dyn MetadataProvider>,
        store: Arc<dyn ProgressStore>,
        fallback_episode_count: u32,
    ) -> Self {
        Self {
            provider,
            store,
            fallback_episode_count,
        }
    }

    pub fn fallback_episode_count(&self) -> u32 {
        self.fallback_episode_count
    }

    /// Looks up show display data. No fallback: failures reach the caller.
    pub async fn fetch_show_summary(&self, show_id: ShowId) -> AppResult<ShowSummary> {
        let summary = self.provider.get_show_summary(show_id).await?;
        Ok(summary)
    }

    /// Starts tracking a show
    ///
    /// Fetches every season's length from the provider. A failed season gets
    /// the fallback count and is flagged degraded; it never aborts the whole
    /// initialization. The fresh record is written to the store and returned
    /// so the caller can clean up related state such as a watchlist entry.
    pub async fn initialize(&self, user_id: &str, summary: ShowSummary) -> AppResult<ShowProgress> {
        let show_id = summary.id;
        if summary.total_seasons > MAX_SEASONS {
            return Err(AppError::InvalidInput(format!(
                "show {} claims {} seasons, at most {} can be tracked",
                show_id, summary.total_seasons, MAX_SEASONS
            )));
        }
        let mut seasons = BTreeMap::new();

        for season_number in 1..=summary.total_seasons {
            let season = match self
                .provider
                .get_season_episode_count(show_id, season_number)
                .await
            {
                Ok(count) => SeasonProgress::provided(count),
                Err(e) => {
                    tracing::warn!(
                        show_id,
                        season = season_number,
                        fallback = self.fallback_episode_count,
                        provider = self.provider.name(),
                        error = %e,
                        "Season lookup failed, using fallback episode count"
                    );
                    SeasonProgress::fallback(self.fallback_episode_count)
                }
            };
            seasons.insert(season_number, season);
        }

        let progress = ShowProgress::new(summary, seasons, Utc::now());

        self.store
            .put_record(user_id, &progress)
            .await
            .inspect_err(|e| {
                tracing::error!(user_id = %user_id, show_id, error = %e, "Failed to store new progress record")
            })?;

        tracing::info!(
            user_id = %user_id,
            show_id,
            title = %progress.show_summary.title,
            seasons = progress.seasons.len(),
            degraded = progress.degraded_seasons().len(),
            "Started tracking show"
        );

        Ok(progress)
    }

    /// Re-fetches every season length and overwrites only the totals
    ///
    /// Covers the show's announced seasons plus any season already in the
    /// record, so lazily created seasons get reconciled too. Failed lookups
    /// leave the season untouched and are listed in the outcome. Successful
    /// lookups also clear the degraded flag.
    pub async fn refresh_season_totals(&self, progress: &ShowProgress) -> AppResult<RefreshOutcome> {
        progress.check_invariants()?;

        let show_id = progress.show_id;
        let mut fetched = BTreeMap::new();
        let mut failed_seasons = Vec::new();

        let announced = progress.show_summary.total_seasons.min(MAX_SEASONS);
        let season_numbers: BTreeSet<u32> = (1..=announced)
            .chain(progress.seasons.keys().copied())
            .collect();

        for season_number in season_numbers {
            match self
                .provider
                .get_season_episode_count(show_id, season_number)
                .await
            {
                Ok(count) => {
                    fetched.insert(season_number, count);
                }
                Err(e) => {
                    tracing::warn!(
                        show_id,
                        season = season_number,
                        provider = self.provider.name(),
                        error = %e,
                        "Season refresh failed, keeping previous total"
                    );
                    failed_seasons.push(season_number);
                }
            }
        }

        let progress = transitions::apply_season_totals(progress, &fetched)?;

        tracing::info!(
            show_id,
            refreshed = fetched.len(),
            failed = failed_seasons.len(),
            "Season totals refreshed"
        );

        Ok(RefreshOutcome {
            progress,
            failed_seasons,
        })
    }

    /// Stops tracking a show. Irreversible.
    pub async fn remove(&self, user_id: &str, show_id: ShowId) -> AppResult<()> {
        self.store
            .delete_record(user_id, show_id)
            .await
            .inspect_err(|e| {
                tracing::error!(user_id = %user_id, show_id, error = %e, "Failed to delete progress record")
            })?;

        tracing::info!(user_id = %user_id, show_id, "Stopped tracking show");
        Ok(())
    }

    pub fn toggle_episode(
        &self,
        progress: &ShowProgress,
        season: u32,
        episode: u32,
    ) -> AppResult<ShowProgress> {
        transitions::toggle_episode(
            progress,
            season,
            episode,
            self.fallback_episode_count,
            Utc::now(),
        )
    }

    pub fn toggle_season(&self, progress: &ShowProgress, season: u32) -> AppResult<ShowProgress> {
        transitions::toggle_season(progress, season, self.fallback_episode_count, Utc::now())
    }

    pub fn mark_show_completed(&self, progress: &ShowProgress) -> AppResult<ShowProgress> {
        transitions::mark_show_completed(progress, Utc::now())
    }

    pub fn mark_show_watching(&self, progress: &ShowProgress) -> ShowProgress {
        transitions::mark_show_watching(progress, Utc::now())
    }

    pub fn mark_show_dropped(&self, progress: &ShowProgress) -> ShowProgress {
        transitions::mark_show_dropped(progress, Utc::now())
    }
}

/// Selects the records shown on a tracker, most recently watched first
///
/// Without a filter, dropped shows are left out.
pub fn tracked_shows(records: Vec<ShowProgress>, status: Option<WatchStatus>) -> Vec<ShowProgress> {
    let mut shows: Vec<ShowProgress> = records
        .into_iter()
        .filter(|progress| match status {
            Some(status) => progress.status == status,
            None => progress.status != WatchStatus::Dropped,
        })
        .collect();

    shows.sort_by(|a, b| b.last_watched.cmp(&a.last_watched));
    shows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::store::MockProgressStore,
        error::{AppError, ProviderError},
        models::{CountSource, EpisodePosition},
        services::providers::MockMetadataProvider,
    };
    use chrono::Duration;
    use mockall::predicate::eq;

    fn summary() -> ShowSummary {
        ShowSummary {
            id: 1396,
            title: "Breaking Bad".to_string(),
            poster_path: Some("/ggFHVNu6YYI5L9pCfOacjizRGt.jpg".to_string()),
            vote_average: Some(8.9),
            first_air_date: Some("2008-01-20".to_string()),
            total_seasons: 2,
            total_episodes: 18,
        }
    }

    fn provider_with_counts(counts: &'static [(u32, Option<u32>)]) -> MockMetadataProvider {
        let mut provider = MockMetadataProvider::new();
        provider.expect_name().return_const("mock");
        for (season, count) in counts {
            let count = *count;
            provider
                .expect_get_season_episode_count()
                .with(eq(1396), eq(*season))
                .times(1)
                .returning(move |_, season| {
                    count.ok_or_else(|| ProviderError::Missing(format!("season {}", season)))
                });
        }
        provider
    }

    fn tracker(provider: MockMetadataProvider, store: MockProgressStore) -> ProgressTracker {
        ProgressTracker::new(Arc::new(provider), Arc::new(store), 10)
    }

    #[tokio::test]
    async fn test_initialize_seeds_seasons_from_provider() {
        let provider = provider_with_counts(&[(1, Some(10)), (2, Some(8))]);
        let mut store = MockProgressStore::new();
        store
            .expect_put_record()
            .withf(|user_id, progress| user_id == "alice" && progress.show_id == 1396)
            .times(1)
            .returning(|_, _| Ok(()));

        let progress = tracker(provider, store)
            .initialize("alice", summary())
            .await
            .unwrap();

        assert_eq!(progress.status, WatchStatus::Watching);
        assert_eq!(progress.current_position, EpisodePosition::START);
        assert_eq!(progress.seasons.len(), 2);
        assert_eq!(progress.seasons[&1], SeasonProgress::provided(10));
        assert_eq!(progress.seasons[&2], SeasonProgress::provided(8));
        assert!(progress.degraded_seasons().is_empty());
    }

    #[tokio::test]
    async fn test_initialize_falls_back_per_season() {
        let provider = provider_with_counts(&[(1, Some(7)), (2, None)]);
        let mut store = MockProgressStore::new();
        store.expect_put_record().times(1).returning(|_, _| Ok(()));

        let progress = tracker(provider, store)
            .initialize("alice", summary())
            .await
            .unwrap();

        assert_eq!(progress.seasons[&1].total_episodes, 7);
        assert_eq!(progress.seasons[&2].total_episodes, 10);
        assert_eq!(progress.seasons[&2].count_source, CountSource::Fallback);
        assert_eq!(progress.degraded_seasons(), vec![2]);
    }

    #[tokio::test]
    async fn test_initialize_surfaces_store_failure() {
        let provider = provider_with_counts(&[(1, Some(10)), (2, Some(8))]);
        let mut store = MockProgressStore::new();
        store.expect_put_record().times(1).returning(|_, _| {
            Err(serde_json::from_str::<u32>("not json").unwrap_err().into())
        });

        let result = tracker(provider, store).initialize("alice", summary()).await;
        assert!(matches!(result, Err(AppError::Store(_))));
    }

    #[tokio::test]
    async fn test_fetch_show_summary_has_no_fallback() {
        let mut provider = MockMetadataProvider::new();
        provider
            .expect_get_show_summary()
            .with(eq(1396))
            .returning(|_| Err(ProviderError::Missing("tv/1396".to_string())));

        let result = tracker(provider, MockProgressStore::new())
            .fetch_show_summary(1396)
            .await;
        assert!(matches!(result, Err(AppError::Provider(_))));
    }

    #[tokio::test]
    async fn test_refresh_keeps_failed_seasons_and_reports_them() {
        let provider = provider_with_counts(&[(1, Some(12)), (2, None)]);
        let tracker = tracker(provider, MockProgressStore::new());

        let mut seasons = BTreeMap::new();
        seasons.insert(1, SeasonProgress::fallback(10));
        seasons.insert(2, SeasonProgress::provided(8));
        let progress = ShowProgress::new(summary(), seasons, Utc::now());
        let progress = tracker.toggle_episode(&progress, 1, 4).unwrap();

        let outcome = tracker.refresh_season_totals(&progress).await.unwrap();

        assert_eq!(outcome.failed_seasons, vec![2]);
        assert_eq!(outcome.progress.seasons[&1].total_episodes, 12);
        assert_eq!(outcome.progress.seasons[&1].count_source, CountSource::Provider);
        assert_eq!(outcome.progress.seasons[&2].total_episodes, 8);
        assert_eq!(
            outcome.progress.seasons[&1].episodes_watched,
            progress.seasons[&1].episodes_watched
        );
    }

    #[tokio::test]
    async fn test_refresh_is_idempotent() {
        let mut provider = MockMetadataProvider::new();
        provider.expect_name().return_const("mock");
        provider
            .expect_get_season_episode_count()
            .returning(|_, season| Ok(if season == 1 { 10 } else { 8 }));
        let tracker = tracker(provider, MockProgressStore::new());

        let mut seasons = BTreeMap::new();
        seasons.insert(1, SeasonProgress::provided(9));
        let progress = ShowProgress::new(summary(), seasons, Utc::now());

        let once = tracker.refresh_season_totals(&progress).await.unwrap();
        let twice = tracker.refresh_season_totals(&once.progress).await.unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice.progress.seasons[&2], SeasonProgress::provided(8));
    }

    #[tokio::test]
    async fn test_refresh_reconciles_season_beyond_announced_count() {
        let provider = provider_with_counts(&[(1, Some(10)), (2, Some(8)), (3, Some(6))]);
        let tracker = tracker(provider, MockProgressStore::new());

        let mut seasons = BTreeMap::new();
        seasons.insert(1, SeasonProgress::provided(10));
        seasons.insert(2, SeasonProgress::provided(8));
        let progress = ShowProgress::new(summary(), seasons, Utc::now());
        let progress = tracker.toggle_episode(&progress, 3, 2).unwrap();
        assert_eq!(progress.degraded_seasons(), vec![3]);

        let outcome = tracker.refresh_season_totals(&progress).await.unwrap();

        assert!(outcome.failed_seasons.is_empty());
        assert!(outcome.progress.degraded_seasons().is_empty());
        assert_eq!(outcome.progress.seasons[&3].total_episodes, 6);
        assert_eq!(outcome.progress.current_position, EpisodePosition::new(3, 2));
    }

    #[tokio::test]
    async fn test_refresh_rejects_corrupt_record_without_lookups() {
        let tracker = tracker(MockMetadataProvider::new(), MockProgressStore::new());

        let mut progress = ShowProgress::new(summary(), BTreeMap::new(), Utc::now());
        progress.current_position = EpisodePosition::new(2, 5);

        let result = tracker.refresh_season_totals(&progress).await;
        assert!(matches!(result, Err(AppError::InvariantViolation(_))));
    }

    #[tokio::test]
    async fn test_initialize_rejects_implausible_season_count() {
        let mut oversized = summary();
        oversized.total_seasons = u32::MAX;

        let result = tracker(MockMetadataProvider::new(), MockProgressStore::new())
            .initialize("alice", oversized)
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_remove_deletes_record() {
        let mut store = MockProgressStore::new();
        store
            .expect_delete_record()
            .withf(|user_id, show_id| user_id == "alice" && *show_id == 1396)
            .times(1)
            .returning(|_, _| Ok(()));

        let result = tracker(MockMetadataProvider::new(), store)
            .remove("alice", 1396)
            .await;
        tokio_test::assert_ok!(result);
    }

    #[test]
    fn test_tracked_shows_hides_dropped_and_orders_by_recency() {
        let base = ShowProgress::new(summary(), BTreeMap::new(), Utc::now());

        let mut older = base.clone();
        older.show_id = 1;
        older.last_watched = base.last_watched - Duration::days(2);

        let mut newer = base.clone();
        newer.show_id = 2;
        newer.status = WatchStatus::Completed;

        let mut dropped = base.clone();
        dropped.show_id = 3;
        dropped.status = WatchStatus::Dropped;

        let records = vec![older.clone(), dropped.clone(), newer.clone()];

        let ids: Vec<ShowId> = tracked_shows(records.clone(), None)
            .iter()
            .map(|p| p.show_id)
            .collect();
        assert_eq!(ids, vec![2, 1]);

        let only_dropped = tracked_shows(records, Some(WatchStatus::Dropped));
        assert_eq!(only_dropped, vec![dropped]);
    }
}

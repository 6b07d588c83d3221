use crate::{
    error::StoreResult,
    models::{ShowId, ShowProgress},
};

/// Per-user keyed collection of progress documents
///
/// Records are addressed by `(user_id, show_id)`. Writes replace the whole
/// document; there is no version check, so two writers racing on the same
/// record resolve as last-writer-wins. Failures are returned as-is, retries
/// are up to the implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ProgressStore: Send + Sync {
    /// Reads one record, `None` when the show is not tracked
    async fn get_record(&self, user_id: &str, show_id: ShowId)
        -> StoreResult<Option<ShowProgress>>;

    /// Writes the whole record, replacing any previous version
    async fn put_record(&self, user_id: &str, progress: &ShowProgress) -> StoreResult<()>;

    /// Deletes a record. Deleting a missing record is not an error.
    async fn delete_record(&self, user_id: &str, show_id: ShowId) -> StoreResult<()>;

    /// Every record of a user, in no particular order
    async fn list_records(&self, user_id: &str) -> StoreResult<Vec<ShowProgress>>;

    /// Removes a watchlist entry, returning whether one existed
    async fn remove_watchlist_entry(&self, user_id: &str, show_id: ShowId) -> StoreResult<bool>;
}

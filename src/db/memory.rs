use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    db::ProgressStore,
    error::StoreResult,
    models::{ShowId, ShowProgress},
};

/// In-process progress store with the same overwrite semantics as Redis
#[derive(Clone, Default)]
pub struct InMemoryProgressStore {
    inner: Arc<RwLock<InMemoryInner>>,
}

#[derive(Default)]
struct InMemoryInner {
    records: HashMap<(String, ShowId), ShowProgress>,
    watchlist: HashSet<(String, ShowId)>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts a show on a user's watchlist
    pub async fn add_watchlist_entry(&self, user_id: &str, show_id: ShowId) {
        let mut inner = self.inner.write().await;
        inner.watchlist.insert((user_id.to_string(), show_id));
    }

    pub async fn is_on_watchlist(&self, user_id: &str, show_id: ShowId) -> bool {
        let inner = self.inner.read().await;
        inner.watchlist.contains(&(user_id.to_string(), show_id))
    }
}

#[async_trait::async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn get_record(
        &self,
        user_id: &str,
        show_id: ShowId,
    ) -> StoreResult<Option<ShowProgress>> {
        let inner = self.inner.read().await;
        Ok(inner.records.get(&(user_id.to_string(), show_id)).cloned())
    }

    async fn put_record(&self, user_id: &str, progress: &ShowProgress) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .records
            .insert((user_id.to_string(), progress.show_id), progress.clone());
        Ok(())
    }

    async fn delete_record(&self, user_id: &str, show_id: ShowId) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.records.remove(&(user_id.to_string(), show_id));
        Ok(())
    }

    async fn list_records(&self, user_id: &str) -> StoreResult<Vec<ShowProgress>> {
        let inner = self.inner.read().await;
        Ok(inner
            .records
            .iter()
            .filter(|((owner, _), _)| owner == user_id)
            .map(|(_, progress)| progress.clone())
            .collect())
    }

    async fn remove_watchlist_entry(&self, user_id: &str, show_id: ShowId) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.watchlist.remove(&(user_id.to_string(), show_id)))
    }
}

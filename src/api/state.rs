use std::sync::Arc;

use crate::{
    db::ProgressStore,
    services::{providers::MetadataProvider, ProgressTracker},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub tracker: ProgressTracker,
    /// Handlers persist transition results here; the tracker never does
    pub store: Arc<dyn ProgressStore>,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn MetadataProvider>,
        store: Arc<dyn ProgressStore>,
        fallback_episode_count: u32,
    ) -> Self {
        Self {
            tracker: ProgressTracker::new(provider, store.clone(), fallback_episode_count),
            store,
        }
    }
}

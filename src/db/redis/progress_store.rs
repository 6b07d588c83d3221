use redis::AsyncCommands;
use redis::Client;

use crate::{
    db::ProgressStore,
    error::StoreResult,
    models::{ShowId, ShowProgress},
};

/// Progress documents stored as JSON strings in Redis
///
/// Layout:
/// - `progress:{user_id}:{show_id}`: the whole `ShowProgress` document
/// - `progress_index:{user_id}`: set of tracked show ids, for collection scans
/// - `watchlist:{user_id}:{show_id}`: watchlist entry, owned by the watchlist feature
#[derive(Clone)]
pub struct RedisProgressStore {
    client: Client,
}

impl RedisProgressStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn record_key(user_id: &str, show_id: ShowId) -> String {
    format!("progress:{}:{}", user_id, show_id)
}

fn index_key(user_id: &str) -> String {
    format!("progress_index:{}", user_id)
}

fn watchlist_key(user_id: &str, show_id: ShowId) -> String {
    format!("watchlist:{}:{}", user_id, show_id)
}

#[async_trait::async_trait]
impl ProgressStore for RedisProgressStore {
    async fn get_record(
        &self,
        user_id: &str,
        show_id: ShowId,
    ) -> StoreResult<Option<ShowProgress>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let json: Option<String> = conn.get(record_key(user_id, show_id)).await?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn put_record(&self, user_id: &str, progress: &ShowProgress) -> StoreResult<()> {
        let json = serde_json::to_string(progress)?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let _: () = redis::pipe()
            .atomic()
            .set(record_key(user_id, progress.show_id), json)
            .ignore()
            .sadd(index_key(user_id), progress.show_id)
            .ignore()
            .query_async(&mut conn)
            .await?;

        tracing::debug!(user_id = %user_id, show_id = progress.show_id, "Progress record written");
        Ok(())
    }

    async fn delete_record(&self, user_id: &str, show_id: ShowId) -> StoreResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let _: () = redis::pipe()
            .atomic()
            .del(record_key(user_id, show_id))
            .ignore()
            .srem(index_key(user_id), show_id)
            .ignore()
            .query_async(&mut conn)
            .await?;

        tracing::debug!(user_id = %user_id, show_id, "Progress record deleted");
        Ok(())
    }

    async fn list_records(&self, user_id: &str) -> StoreResult<Vec<ShowProgress>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let show_ids: Vec<ShowId> = conn.smembers(index_key(user_id)).await?;

        if show_ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = show_ids
            .iter()
            .map(|show_id| record_key(user_id, *show_id))
            .collect();
        let documents: Vec<Option<String>> =
            redis::cmd("MGET").arg(&keys).query_async(&mut conn).await?;

        let mut records = Vec::with_capacity(documents.len());
        for (show_id, document) in show_ids.iter().zip(documents) {
            match document {
                Some(json) => records.push(serde_json::from_str(&json)?),
                None => {
                    tracing::warn!(user_id = %user_id, show_id, "Index entry without a progress record");
                }
            }
        }

        Ok(records)
    }

    async fn remove_watchlist_entry(&self, user_id: &str, show_id: ShowId) -> StoreResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let removed: i64 = conn.del(watchlist_key(user_id, show_id)).await?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::redis::create_redis_client;
    use crate::models::{SeasonProgress, ShowSummary};
    use chrono::Utc;
    use std::collections::BTreeMap;

    #[test]
    fn test_record_key() {
        assert_eq!(record_key("uid-42", 1396), "progress:uid-42:1396");
    }

    #[test]
    fn test_index_key() {
        assert_eq!(index_key("uid-42"), "progress_index:uid-42");
    }

    #[test]
    fn test_watchlist_key() {
        assert_eq!(watchlist_key("uid-42", 1396), "watchlist:uid-42:1396");
    }

    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_round_trip_against_redis() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let store = RedisProgressStore::new(create_redis_client(&redis_url).unwrap());
        let user_id = "redis-test-user";

        let summary = ShowSummary {
            id: 999_100,
            title: "Redis Test Show".to_string(),
            poster_path: None,
            vote_average: None,
            first_air_date: None,
            total_seasons: 1,
            total_episodes: 4,
        };
        let progress = ShowProgress::new(
            summary,
            BTreeMap::from([(1, SeasonProgress::provided(4))]),
            Utc::now(),
        );

        store.put_record(user_id, &progress).await.unwrap();
        assert_eq!(
            store.get_record(user_id, 999_100).await.unwrap(),
            Some(progress.clone())
        );
        assert_eq!(store.list_records(user_id).await.unwrap(), vec![progress]);

        store.delete_record(user_id, 999_100).await.unwrap();
        assert!(store.get_record(user_id, 999_100).await.unwrap().is_none());
        assert!(store.list_records(user_id).await.unwrap().is_empty());
    }
}

/// Read-through caching for provider lookups.
///
/// Returns the cached value when present. Otherwise awaits `$block`, queues
/// its value for a background cache write and returns it. A failed cache read
/// is logged and treated as a miss, so Redis trouble never fails a lookup;
/// errors from `$block` propagate with `?`.
///
/// # Arguments
/// * `$cache`: a [`Cache`](crate::db::Cache)
/// * `$key`: the [`CacheKey`](crate::db::CacheKey) to read and write
/// * `$ttl`: time-to-live of the written value in seconds
/// * `$block`: future computing the value on a miss
///
/// # Example
/// ```rust,ignore
/// async fn season_count(&self, id: ShowId) -> ProviderResult<u32> {
///     cached!(self.cache, CacheKey::SeasonEpisodeCount(id, 1), self.ttl, async move {
///         self.fetch_count(id, 1).await
///     })
/// }
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(cached)) => Ok(cached),
            lookup => {
                if let Err(e) = lookup {
                    tracing::warn!(error = %e, key = %key, "Cache read failed, treating as miss");
                }
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}

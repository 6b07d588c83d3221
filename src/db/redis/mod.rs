pub mod cache;
pub mod progress_store;

mod macros;

use redis::Client;

pub use cache::Cache;
pub use cache::CacheKey;
pub use cache::CacheWriterHandle;
pub use progress_store::RedisProgressStore;

/// Creates a Redis client
///
/// Opening the client does not connect; connections are made per operation
/// through the multiplexed async connection.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

pub mod memory;
pub mod redis;
pub mod store;

pub use self::memory::InMemoryProgressStore;
pub use self::redis::create_redis_client;
pub use self::redis::Cache;
pub use self::redis::CacheKey;
pub use self::redis::RedisProgressStore;
pub use self::store::ProgressStore;

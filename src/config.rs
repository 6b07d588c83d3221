use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Redis connection URL (progress documents and metadata cache)
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// TMDB API key (v3) or read access token (v4)
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Episode count substituted for a season whose count could not be fetched
    #[serde(default = "default_fallback_episode_count")]
    pub fallback_episode_count: u32,

    /// How long provider lookups stay cached, in seconds
    #[serde(default = "default_metadata_cache_ttl")]
    pub metadata_cache_ttl: u64,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_fallback_episode_count() -> u32 {
    crate::models::DEFAULT_FALLBACK_EPISODE_COUNT
}

fn default_metadata_cache_ttl() -> u64 {
    86400 // 1 day
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        if config.fallback_episode_count == 0 {
            anyhow::bail!("FALLBACK_EPISODE_COUNT must be at least 1");
        }

        Ok(config)
    }

    /// Address the HTTP listener binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

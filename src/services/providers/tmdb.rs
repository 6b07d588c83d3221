/// TMDB metadata provider
///
/// API Flow:
/// 1. Show summary: /tv/{id} → name, poster, number_of_seasons
/// 2. Season length: /tv/{id}/season/{n} → episodes[] (count = list length)
///
/// Authenticates with a bearer token when given a v4 read access token
/// (a JWT, so it starts with `eyJ`), otherwise with the v3 `api_key` query
/// parameter. Both lookups are cached in Redis.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{ProviderError, ProviderResult},
    models::{ShowId, ShowSummary, TmdbSeasonDetails, TmdbTvDetails},
    services::providers::MetadataProvider,
};
use reqwest::{Client as HttpClient, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    use_bearer: bool,
    cache: Cache,
    cache_ttl: u64,
}

impl TmdbProvider {
    pub fn new(cache: Cache, api_key: String, api_url: String, cache_ttl: u64) -> Self {
        let use_bearer = api_key.starts_with("eyJ");
        let auth = if use_bearer { "bearer" } else { "api_key" };

        tracing::info!(api_url = %api_url, auth, "TMDB provider configured");

        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            use_bearer,
            cache,
            cache_ttl,
        }
    }

    /// Builds an authenticated GET request for an API path
    fn request(&self, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.api_url, path);
        let request = self.http_client.get(url);

        if self.use_bearer {
            request.bearer_auth(&self.api_key)
        } else {
            request.query(&[("api_key", self.api_key.as_str())])
        }
    }

    /// Fetches and decodes a JSON document, mapping 404 to `Missing`
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ProviderResult<T> {
        let response = self.request(path).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::Missing(path.to_string()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(path = %path, status = %status, body = %body, "TMDB request failed");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(path = %path, error = %e, "Failed to deserialize TMDB response");
            ProviderError::Decode(e.to_string())
        })
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn get_show_summary(&self, show_id: ShowId) -> ProviderResult<ShowSummary> {
        cached!(
            self.cache,
            CacheKey::ShowSummary(show_id),
            self.cache_ttl,
            async move {
                let details: TmdbTvDetails = self.get_json(&format!("tv/{}", show_id)).await?;
                let summary = ShowSummary::from(details);

                tracing::info!(
                    show_id,
                    title = %summary.title,
                    seasons = summary.total_seasons,
                    provider = "tmdb",
                    "Show summary fetched"
                );

                Ok::<_, ProviderError>(summary)
            }
        )
    }

    async fn get_season_episode_count(
        &self,
        show_id: ShowId,
        season_number: u32,
    ) -> ProviderResult<u32> {
        cached!(
            self.cache,
            CacheKey::SeasonEpisodeCount(show_id, season_number),
            self.cache_ttl,
            async move {
                let season: TmdbSeasonDetails = self
                    .get_json(&format!("tv/{}/season/{}", show_id, season_number))
                    .await?;

                tracing::debug!(
                    show_id,
                    season = season_number,
                    episodes = season.episode_count(),
                    provider = "tmdb",
                    "Season episode count fetched"
                );

                Ok::<_, ProviderError>(season.episode_count())
            }
        )
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

/// TMDB (The Movie Database) provider
///
/// Uses the title search endpoint and takes the first match:
/// `GET {api_url}/3/search/movie?api_key=…&query=…`
use crate::{
    models::{EnrichmentRecord, TmdbSearchResponse},
    services::providers::{EnrichmentError, EnrichmentSource},
};
use reqwest::Client as HttpClient;
use std::time::Duration;

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_base_url: String,
}

impl TmdbProvider {
    /// Creates a provider whose HTTP client gives up after `timeout`
    pub fn new(
        api_key: String,
        api_url: String,
        image_base_url: String,
        timeout: Duration,
    ) -> Result<Self, EnrichmentError> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url,
            image_base_url,
        })
    }

    fn parse_search(&self, body: &str) -> Result<Option<EnrichmentRecord>, EnrichmentError> {
        let response: TmdbSearchResponse =
            serde_json::from_str(body).map_err(|e| EnrichmentError::Malformed(e.to_string()))?;

        Ok(response.results.into_iter().next().map(|movie| {
            tracing::debug!(
                tmdb_id = movie.id,
                matched_title = movie.title.as_deref().unwrap_or_default(),
                provider = "tmdb",
                "Using first search result"
            );
            movie.into_record(&self.image_base_url)
        }))
    }
}

#[async_trait::async_trait]
impl EnrichmentSource for TmdbProvider {
    async fn lookup(&self, title: &str) -> Result<Option<EnrichmentRecord>, EnrichmentError> {
        let url = format!("{}/3/search/movie", self.api_url.trim_end_matches('/'));

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("query", title)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::debug!(title = %title, status = %status, provider = "tmdb", "Lookup rejected");
            return Err(EnrichmentError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let record = self.parse_search(&body)?;

        tracing::debug!(
            title = %title,
            found = record.is_some(),
            provider = "tmdb",
            "Lookup completed"
        );

        Ok(record)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

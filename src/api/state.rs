use std::{sync::Arc, time::Duration};

use crate::{
    config::Config,
    corpus::Corpus,
    services::{enrichment::EnrichmentFanout, providers::TmdbProvider},
};

/// HTTP-facing settings shared by handlers and the router
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub default_limit: usize,
    pub max_limit: usize,
    /// `*` or a list of exact origins
    pub cors_allowed_origins: Vec<String>,
    pub request_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 50,
            cors_allowed_origins: vec!["*".to_string()],
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&Config> for ApiSettings {
    fn from(config: &Config) -> Self {
        Self {
            default_limit: config.default_limit,
            max_limit: config.max_limit,
            cors_allowed_origins: config.cors_origins(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

/// Shared application state
///
/// Everything in here is read-only after startup, so cloning the state per
/// request is just a handful of reference-count bumps.
#[derive(Clone)]
pub struct AppState {
    pub corpus: Arc<Corpus>,
    /// `None` when no API credential is configured
    pub enrichment: Option<EnrichmentFanout>,
    pub settings: Arc<ApiSettings>,
}

impl AppState {
    pub fn new(
        corpus: Arc<Corpus>,
        enrichment: Option<EnrichmentFanout>,
        settings: ApiSettings,
    ) -> Self {
        Self {
            corpus,
            enrichment,
            settings: Arc::new(settings),
        }
    }

    /// Wires the state from configuration, enabling TMDB enrichment when a key is set
    pub fn from_config(config: &Config, corpus: Corpus) -> anyhow::Result<Self> {
        let enrichment = match config.tmdb_api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            Some(api_key) => {
                let timeout = Duration::from_secs(config.enrichment_timeout_secs);
                let provider = TmdbProvider::new(
                    api_key.to_string(),
                    config.tmdb_api_url.clone(),
                    config.tmdb_image_base_url.clone(),
                    timeout,
                )?;
                tracing::info!(
                    provider = "tmdb",
                    max_in_flight = config.enrichment_max_in_flight,
                    timeout_secs = config.enrichment_timeout_secs,
                    "Enrichment enabled"
                );
                Some(EnrichmentFanout::new(
                    Arc::new(provider),
                    timeout,
                    config.enrichment_max_in_flight,
                ))
            }
            None => {
                tracing::warn!("TMDB_API_KEY not set; serving local metadata only");
                None
            }
        };

        Ok(Self::new(Arc::new(corpus), enrichment, ApiSettings::from(config)))
    }
}

use serde::Deserialize;
use std::path::PathBuf;

use crate::corpus::{CorpusPaths, LoadStrategy, SimilarityMode};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bincode CSR feature matrix
    #[serde(default = "default_feature_matrix_path")]
    pub feature_matrix_path: PathBuf,

    /// JSON array of movie metadata records
    #[serde(default = "default_metadata_path")]
    pub metadata_path: PathBuf,

    /// JSON array of `{ title, row }` entries
    #[serde(default = "default_title_index_path")]
    pub title_index_path: PathBuf,

    /// `eager` or `mapped`
    #[serde(default)]
    pub corpus_load_strategy: LoadStrategy,

    /// `on_demand` or `precomputed`
    #[serde(default)]
    pub similarity_mode: SimilarityMode,

    /// Neighbors stored per row in precomputed mode; defaults to `max_limit`
    #[serde(default)]
    pub precompute_depth: Option<usize>,

    #[serde(default = "default_limit")]
    pub default_limit: usize,

    #[serde(default = "default_max_limit")]
    pub max_limit: usize,

    /// TMDB API key; enrichment is skipped when absent
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    #[serde(default = "default_tmdb_image_base_url")]
    pub tmdb_image_base_url: String,

    #[serde(default = "default_enrichment_timeout_secs")]
    pub enrichment_timeout_secs: u64,

    #[serde(default = "default_enrichment_max_in_flight")]
    pub enrichment_max_in_flight: usize,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Comma-separated origins, or `*`
    #[serde(default = "default_cors_allowed_origins")]
    pub cors_allowed_origins: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_feature_matrix_path() -> PathBuf {
    PathBuf::from("artifacts/tfidf_matrix.bin")
}

fn default_metadata_path() -> PathBuf {
    PathBuf::from("artifacts/movies.json")
}

fn default_title_index_path() -> PathBuf {
    PathBuf::from("artifacts/indices.json")
}

fn default_limit() -> usize {
    10
}

fn default_max_limit() -> usize {
    50
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_enrichment_timeout_secs() -> u64 {
    5
}

fn default_enrichment_max_in_flight() -> usize {
    8
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_cors_allowed_origins() -> String {
    "*".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            anyhow::bail!(
                "DEFAULT_LIMIT must be between 1 and MAX_LIMIT ({}), got {}",
                self.max_limit,
                self.default_limit
            );
        }
        if self.enrichment_max_in_flight == 0 {
            anyhow::bail!("ENRICHMENT_MAX_IN_FLIGHT must be at least 1");
        }
        Ok(())
    }

    pub fn corpus_paths(&self) -> CorpusPaths {
        CorpusPaths {
            feature_matrix: self.feature_matrix_path.clone(),
            metadata: self.metadata_path.clone(),
            title_index: self.title_index_path.clone(),
        }
    }

    pub fn precompute_depth(&self) -> usize {
        self.precompute_depth.unwrap_or(self.max_limit)
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }
}

use serde::{Deserialize, Serialize};

pub mod movie;

pub use movie::{MetadataRecord, RecommendationResponse, ResultItem};

/// A corpus row paired with its similarity to the query row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedCandidate {
    pub row: usize,
    pub score: f64,
}

/// Supplementary metadata fetched from the remote source for one title
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    /// Absolute poster image URL
    pub poster_url: Option<String>,
    pub overview: Option<String>,
    pub original_language: Option<String>,
    pub vote_average: Option<f64>,
    pub popularity: Option<f64>,
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Raw response from TMDB `/3/search/movie`
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSearchResponse {
    #[serde(default)]
    pub results: Vec<TmdbMovie>,
}

/// A single movie from a TMDB search result
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub popularity: Option<f64>,
}

impl TmdbMovie {
    /// Converts to an enrichment record, expanding the relative poster path
    pub fn into_record(self, image_base_url: &str) -> EnrichmentRecord {
        let poster_url = self
            .poster_path
            .filter(|path| !path.trim().is_empty())
            .map(|path| format!("{}{}", image_base_url.trim_end_matches('/'), path));

        EnrichmentRecord {
            poster_url,
            overview: self.overview,
            original_language: self.original_language,
            vote_average: self.vote_average,
            popularity: self.popularity,
        }
    }
}

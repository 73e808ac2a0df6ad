use serde::{Deserialize, Serialize};

/// One row of the local metadata table, aligned with the feature matrix by index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MetadataRecord {
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub genres: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub popularity: Option<f64>,
}

impl MetadataRecord {
    /// Creates a record with only a display title
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// A single recommendation returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultItem {
    pub title: String,
    pub poster_path: String,
    pub overview: String,
    pub genres: String,
    pub tagline: String,
    pub original_language: String,
    pub vote_average: f64,
    pub popularity: f64,
    /// Cosine similarity to the searched movie
    pub similarity: f64,
    /// True only for the searched movie itself when it is echoed back
    #[serde(default)]
    pub is_searched: bool,
}

/// Response body of the recommendation endpoints
///
/// A title that cannot be resolved is reported in `error` with an empty list,
/// never as an HTTP error status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub recommendations: Vec<ResultItem>,
}

impl RecommendationResponse {
    pub const NOT_FOUND_MESSAGE: &'static str = "Movie not found";

    pub fn found(recommendations: Vec<ResultItem>) -> Self {
        Self {
            error: None,
            recommendations,
        }
    }

    pub fn not_found() -> Self {
        Self {
            error: Some(Self::NOT_FOUND_MESSAGE.to_string()),
            recommendations: Vec::new(),
        }
    }
}

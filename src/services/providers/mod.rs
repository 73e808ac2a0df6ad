//! Enrichment data provider abstraction
//!
//! A provider answers "what does the remote catalogue know about this title?".
//! Providers report failures honestly; the fan-out decides how they degrade.

use crate::models::EnrichmentRecord;

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Failure of a single remote lookup
#[derive(thiserror::Error, Debug)]
pub enum EnrichmentError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote source returned status {0}")]
    Status(u16),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Trait for remote metadata sources
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EnrichmentSource: Send + Sync {
    /// Looks up one movie by display title
    ///
    /// `Ok(None)` means the source answered but knows no such title.
    async fn lookup(&self, title: &str) -> Result<Option<EnrichmentRecord>, EnrichmentError>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

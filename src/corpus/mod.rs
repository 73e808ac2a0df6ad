//! Read-only corpus store
//!
//! Holds the three row-aligned artifacts (feature matrix, metadata table, title
//! index) for the lifetime of the process. A loaded [`Corpus`] is never mutated,
//! so request handlers share it through an `Arc` without locking.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;

use crate::{
    error::{AppError, AppResult, CorpusLoadError},
    models::{MetadataRecord, RankedCandidate},
    services::{neighbors::NeighborTable, similarity},
};

pub mod artifacts;
pub mod matrix;
pub mod title_index;

pub use artifacts::{CorpusPaths, LoadStrategy};
pub use matrix::{FeatureMatrix, MatrixArtifact, SparseRow};
pub use title_index::{normalize_title, TitleEntry, TitleIndex};

/// Per-row movie metadata, aligned with the feature matrix
#[derive(Debug, Clone, Default)]
pub struct MetadataTable {
    records: Vec<MetadataRecord>,
}

impl MetadataTable {
    pub fn new(records: Vec<MetadataRecord>) -> Self {
        Self { records }
    }

    pub fn get(&self, row: usize) -> Option<&MetadataRecord> {
        self.records.get(row)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetadataRecord> {
        self.records.iter()
    }
}

/// How ranking requests are answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMode {
    /// Score the whole corpus per request
    #[default]
    OnDemand,
    /// Serve from a neighbor table built at startup
    Precomputed,
}

/// Immutable, validated corpus handle
#[derive(Debug)]
pub struct Corpus {
    matrix: FeatureMatrix,
    metadata: MetadataTable,
    titles: TitleIndex,
    neighbors: Option<NeighborTable>,
    loaded_at: DateTime<Utc>,
}

impl Corpus {
    /// Loads and validates all three artifacts
    pub fn load(paths: &CorpusPaths, strategy: LoadStrategy) -> Result<Self, CorpusLoadError> {
        let start = Instant::now();

        let matrix = FeatureMatrix::from_artifact(artifacts::read_feature_matrix(
            &paths.feature_matrix,
            strategy,
        )?)?;
        let metadata = MetadataTable::new(artifacts::read_metadata(&paths.metadata, strategy)?);
        let titles = TitleIndex::from_entries(artifacts::read_title_entries(
            &paths.title_index,
            strategy,
        )?);

        let corpus = Self::from_parts(matrix, metadata, titles)?;

        tracing::info!(
            rows = corpus.len(),
            dimensions = corpus.dimensions(),
            nnz = corpus.matrix.nnz(),
            titles = corpus.titles.len(),
            strategy = ?strategy,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Corpus loaded"
        );

        Ok(corpus)
    }

    /// Validates row alignment of already-built parts
    pub fn from_parts(
        matrix: FeatureMatrix,
        metadata: MetadataTable,
        titles: TitleIndex,
    ) -> Result<Self, CorpusLoadError> {
        if matrix.rows() != metadata.len() {
            return Err(CorpusLoadError::RowCountMismatch {
                matrix: matrix.rows(),
                metadata: metadata.len(),
            });
        }

        if let Some(entry) = titles.widest_entry().filter(|e| e.row >= matrix.rows()) {
            return Err(CorpusLoadError::TitleIndexOutOfRange {
                title: entry.title.clone(),
                row: entry.row,
                rows: matrix.rows(),
            });
        }

        if titles.collisions() > 0 {
            tracing::warn!(
                collisions = titles.collisions(),
                "Title index has duplicate normalized titles; first entry kept"
            );
        }

        Ok(Self {
            matrix,
            metadata,
            titles,
            neighbors: None,
            loaded_at: Utc::now(),
        })
    }

    /// Precomputes the top-`depth` neighbors of every row
    pub fn with_neighbor_table(mut self, depth: usize) -> Self {
        self.neighbors = Some(NeighborTable::build(&self.matrix, depth));
        self
    }

    /// Resolves a free-text title to its row
    pub fn resolve(&self, title: &str) -> Option<usize> {
        self.titles.get(title)
    }

    pub fn metadata(&self, row: usize) -> AppResult<&MetadataRecord> {
        self.metadata.get(row).ok_or(AppError::IndexOutOfRange {
            row,
            len: self.len(),
        })
    }

    pub fn metadata_table(&self) -> &MetadataTable {
        &self.metadata
    }

    pub fn matrix(&self) -> &FeatureMatrix {
        &self.matrix
    }

    /// Top-`k` most similar rows to `row`, excluding `row`
    pub fn top_k(&self, row: usize, k: usize) -> AppResult<Vec<RankedCandidate>> {
        if row >= self.len() {
            return Err(AppError::IndexOutOfRange {
                row,
                len: self.len(),
            });
        }

        if let Some(stored) = self.neighbors.as_ref().and_then(|table| table.get(row, k)) {
            return Ok(stored.to_vec());
        }

        Ok(similarity::top_k(&self.matrix, row, k))
    }

    pub fn similarity_mode(&self) -> SimilarityMode {
        if self.neighbors.is_some() {
            SimilarityMode::Precomputed
        } else {
            SimilarityMode::OnDemand
        }
    }

    /// Number of movies (N)
    pub fn len(&self) -> usize {
        self.matrix.rows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dimensions(&self) -> usize {
        self.matrix.cols()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

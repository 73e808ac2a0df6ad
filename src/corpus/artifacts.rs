use memmap2::Mmap;
use serde::{de::DeserializeOwned, Deserialize};
use std::{
    fs::File,
    path::{Path, PathBuf},
};

use crate::{
    corpus::{matrix::MatrixArtifact, title_index::TitleEntry},
    error::CorpusLoadError,
    models::MetadataRecord,
};

/// How artifact files are brought into memory before decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStrategy {
    /// Read the whole file into a heap buffer
    #[default]
    Eager,
    /// Decode directly from a read-only memory map of the file
    Mapped,
}

/// Locations of the three corpus artifacts
#[derive(Debug, Clone)]
pub struct CorpusPaths {
    pub feature_matrix: PathBuf,
    pub metadata: PathBuf,
    pub title_index: PathBuf,
}

impl CorpusPaths {
    /// Standard file names inside one artifacts directory
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            feature_matrix: dir.join("tfidf_matrix.bin"),
            metadata: dir.join("movies.json"),
            title_index: dir.join("indices.json"),
        }
    }
}

pub fn read_feature_matrix(
    path: &Path,
    strategy: LoadStrategy,
) -> Result<MatrixArtifact, CorpusLoadError> {
    read_artifact(path, strategy, |bytes| {
        bincode::deserialize(bytes).map_err(|e| e.to_string())
    })
}

pub fn read_metadata(
    path: &Path,
    strategy: LoadStrategy,
) -> Result<Vec<MetadataRecord>, CorpusLoadError> {
    read_artifact(path, strategy, decode_json)
}

pub fn read_title_entries(
    path: &Path,
    strategy: LoadStrategy,
) -> Result<Vec<TitleEntry>, CorpusLoadError> {
    read_artifact(path, strategy, decode_json)
}

fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, String> {
    serde_json::from_slice(bytes).map_err(|e| e.to_string())
}

fn read_artifact<T>(
    path: &Path,
    strategy: LoadStrategy,
    decode: impl FnOnce(&[u8]) -> Result<T, String>,
) -> Result<T, CorpusLoadError> {
    if !path.exists() {
        return Err(CorpusLoadError::Missing(path.to_path_buf()));
    }

    let unreadable = |source: std::io::Error| CorpusLoadError::Unreadable {
        path: path.to_path_buf(),
        source,
    };

    let decoded = match strategy {
        LoadStrategy::Eager => {
            let bytes = std::fs::read(path).map_err(unreadable)?;
            decode(&bytes)
        }
        LoadStrategy::Mapped => {
            let file = File::open(path).map_err(unreadable)?;
            let len = file.metadata().map_err(unreadable)?.len();
            if len == 0 {
                // Mapping a zero-length file fails on some platforms
                decode(&[])
            } else {
                // SAFETY: artifacts are immutable for the process lifetime; the map is
                // dropped as soon as decoding finishes.
                let mmap = unsafe { Mmap::map(&file) }.map_err(unreadable)?;
                decode(&mmap[..])
            }
        }
    };

    decoded.map_err(|reason| CorpusLoadError::Malformed {
        path: path.to_path_buf(),
        reason,
    })
}

use serde::{Deserialize, Serialize};
use sprs::{CsMat, CsVecView};

use crate::error::CorpusLoadError;

/// On-disk CSR layout of the feature matrix, encoded with bincode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixArtifact {
    pub rows: usize,
    pub cols: usize,
    pub indptr: Vec<usize>,
    pub indices: Vec<usize>,
    pub data: Vec<f64>,
}

/// Borrowed view of one sparse row
pub type SparseRow<'a> = CsVecView<'a, f64>;

/// Immutable row-major sparse matrix of non-negative feature weights
///
/// Row L2 norms are computed once when the matrix is built.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    inner: CsMat<f64>,
    norms: Vec<f64>,
}

impl FeatureMatrix {
    /// Validates raw CSR arrays and builds the matrix
    pub fn from_artifact(artifact: MatrixArtifact) -> Result<Self, CorpusLoadError> {
        if artifact.indptr.first().copied().unwrap_or(0) != 0 {
            return Err(CorpusLoadError::InvalidMatrix(
                "row pointer must start at 0".to_string(),
            ));
        }

        if let Some(bad) = artifact.data.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(CorpusLoadError::InvalidMatrix(format!(
                "feature weights must be finite and non-negative, found {}",
                bad
            )));
        }

        let inner = CsMat::try_new(
            (artifact.rows, artifact.cols),
            artifact.indptr,
            artifact.indices,
            artifact.data,
        )
        .map_err(|(_, _, _, e)| CorpusLoadError::InvalidMatrix(e.to_string()))?;

        let norms = inner.outer_iterator().map(|row| row.l2_norm()).collect();

        Ok(Self { inner, norms })
    }

    /// Builds a matrix from per-row `(column, weight)` lists
    ///
    /// Entries within a row may be unordered; duplicate columns are summed.
    pub fn from_rows(
        cols: usize,
        rows: Vec<Vec<(usize, f64)>>,
    ) -> Result<Self, CorpusLoadError> {
        let mut indptr = Vec::with_capacity(rows.len() + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);

        let row_count = rows.len();
        for mut row in rows {
            let row_start = indices.len();
            row.sort_by_key(|(col, _)| *col);
            for (col, weight) in row {
                if indices.len() > row_start && indices.last() == Some(&col) {
                    if let Some(last) = data.last_mut() {
                        *last += weight;
                    }
                    continue;
                }
                indices.push(col);
                data.push(weight);
            }
            indptr.push(indices.len());
        }

        Self::from_artifact(MatrixArtifact {
            rows: row_count,
            cols,
            indptr,
            indices,
            data,
        })
    }

    pub fn to_artifact(&self) -> MatrixArtifact {
        let mut indptr = Vec::with_capacity(self.rows() + 1);
        indptr.push(0);
        for row in self.iter_rows() {
            indptr.push(indptr[indptr.len() - 1] + row.nnz());
        }

        MatrixArtifact {
            rows: self.rows(),
            cols: self.cols(),
            indptr,
            indices: self.inner.indices().to_vec(),
            data: self.inner.data().to_vec(),
        }
    }

    /// Number of corpus items (N)
    pub fn rows(&self) -> usize {
        self.inner.rows()
    }

    /// Feature dimensionality (D)
    pub fn cols(&self) -> usize {
        self.inner.cols()
    }

    pub fn nnz(&self) -> usize {
        self.inner.nnz()
    }

    pub fn row(&self, row: usize) -> Option<SparseRow<'_>> {
        self.inner.outer_view(row)
    }

    pub fn norm(&self, row: usize) -> Option<f64> {
        self.norms.get(row).copied()
    }

    pub(crate) fn norms(&self) -> &[f64] {
        &self.norms
    }

    /// Iterates rows in order
    pub fn iter_rows(&self) -> impl Iterator<Item = SparseRow<'_>> {
        self.inner.outer_iterator()
    }
}

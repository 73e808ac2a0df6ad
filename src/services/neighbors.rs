use rayon::prelude::*;
use std::time::Instant;

use crate::{corpus::FeatureMatrix, models::RankedCandidate, services::similarity};

/// Top-`depth` neighbors of every row, computed once at startup
///
/// A lookup for `k <= depth` returns the same candidates as [`similarity::top_k`]
/// because each stored list is already a ranked prefix.
#[derive(Debug, Clone)]
pub struct NeighborTable {
    depth: usize,
    lists: Vec<Vec<RankedCandidate>>,
}

impl NeighborTable {
    pub fn build(matrix: &FeatureMatrix, depth: usize) -> Self {
        let start = Instant::now();

        let lists: Vec<Vec<RankedCandidate>> = (0..matrix.rows())
            .into_par_iter()
            .map(|row| similarity::top_k(matrix, row, depth))
            .collect();

        tracing::info!(
            rows = lists.len(),
            depth,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Precomputed neighbor table"
        );

        Self { depth, lists }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Stored neighbors for `row`, or `None` when the table cannot answer `k`
    pub fn get(&self, row: usize, k: usize) -> Option<&[RankedCandidate]> {
        if k > self.depth {
            return None;
        }
        let list = self.lists.get(row)?;
        Some(&list[..k.min(list.len())])
    }
}

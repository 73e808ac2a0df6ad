use std::cmp::Ordering;

use crate::{
    corpus::{FeatureMatrix, SparseRow},
    models::RankedCandidate,
};

/// Cosine similarity of two non-negative sparse rows
///
/// Returns 0 when either row has zero norm. The result is clamped into [0, 1].
pub fn cosine_similarity(a: &SparseRow<'_>, b: &SparseRow<'_>) -> f64 {
    let norm_a = a.l2_norm();
    let norm_b = b.l2_norm();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    clamp_score(a.dot(b) / (norm_a * norm_b))
}

/// Score of a row against itself: 1 unless the row is all zeros
pub fn self_similarity(matrix: &FeatureMatrix, row: usize) -> f64 {
    match matrix.norm(row) {
        Some(norm) if norm > 0.0 => 1.0,
        _ => 0.0,
    }
}

/// Ranking order: score descending, ties by ascending row index
pub fn rank_order(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.row.cmp(&b.row))
}

/// Scores every row of the matrix against `query_row`, in row order
///
/// The query row is scattered into a dense buffer once so each candidate costs
/// only its own non-zero count.
pub fn score_all(matrix: &FeatureMatrix, query_row: usize) -> Vec<RankedCandidate> {
    let Some(query) = matrix.row(query_row) else {
        return Vec::new();
    };
    let query_norm = matrix.norm(query_row).unwrap_or(0.0);

    if query_norm == 0.0 {
        return (0..matrix.rows())
            .map(|row| RankedCandidate { row, score: 0.0 })
            .collect();
    }

    let mut dense = vec![0.0; matrix.cols()];
    for (col, &weight) in query.iter() {
        dense[col] = weight;
    }

    matrix
        .iter_rows()
        .zip(matrix.norms())
        .enumerate()
        .map(|(row, (candidate, &norm))| {
            let score = if norm == 0.0 {
                0.0
            } else {
                let dot: f64 = candidate
                    .iter()
                    .map(|(col, &weight)| dense[col] * weight)
                    .sum();
                clamp_score(dot / (query_norm * norm))
            };
            RankedCandidate { row, score }
        })
        .collect()
}

/// Returns the `k` rows most similar to `query_row`, excluding the query row itself
///
/// Output length is `min(k, N - 1)`, ordered by [`rank_order`]. Only the best
/// `k + 1` scores are selected (average O(N)) and sorted (O(k log k)); the extra
/// slot absorbs the query row's own score.
pub fn top_k(matrix: &FeatureMatrix, query_row: usize, k: usize) -> Vec<RankedCandidate> {
    let n = matrix.rows();
    if n <= 1 || k == 0 || query_row >= n {
        return Vec::new();
    }

    let mut candidates = score_all(matrix, query_row);
    select_best(&mut candidates, k.saturating_add(1));

    candidates.retain(|candidate| candidate.row != query_row);
    candidates.truncate(k);
    candidates
}

/// Keeps the best `m` candidates under [`rank_order`], sorted
fn select_best(candidates: &mut Vec<RankedCandidate>, m: usize) {
    if m < candidates.len() {
        candidates.select_nth_unstable_by(m - 1, rank_order);
        candidates.truncate(m);
    }
    candidates.sort_unstable_by(rank_order);
}

// NaN and negative rounding noise both land on 0
fn clamp_score(raw: f64) -> f64 {
    if raw > 0.0 {
        raw.min(1.0)
    } else {
        0.0
    }
}

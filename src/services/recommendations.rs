use std::sync::Arc;

use crate::{
    api::AppState,
    error::{AppError, AppResult},
    models::{RankedCandidate, RecommendationResponse},
    services::{assembler, similarity},
};

/// Per-request knobs for a recommendation lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendOptions {
    /// Number of similar movies to return
    pub limit: usize,
    /// Prepend the searched movie itself to the list
    pub include_searched: bool,
}

/// Recommends the movies most similar to `title`
///
/// Returns `AppError::NotFound` when the title is not in the corpus; no
/// outward calls are made in that case. Enrichment failures never surface
/// here, they only degrade individual fields to their fallbacks.
pub async fn recommend(
    state: &AppState,
    title: &str,
    options: RecommendOptions,
) -> AppResult<RecommendationResponse> {
    let corpus = Arc::clone(&state.corpus);

    let row = corpus
        .resolve(title)
        .ok_or_else(|| AppError::NotFound(title.trim().to_string()))?;

    // Ranking is CPU-bound; keep it off the async workers
    let ranking_corpus = Arc::clone(&corpus);
    let mut candidates =
        tokio::task::spawn_blocking(move || ranking_corpus.top_k(row, options.limit))
            .await
            .map_err(|e| AppError::Internal(format!("Ranking task failed: {}", e)))??;

    if options.include_searched {
        candidates.insert(
            0,
            RankedCandidate {
                row,
                score: similarity::self_similarity(corpus.matrix(), row),
            },
        );
    }

    let titles = candidates
        .iter()
        .map(|candidate| corpus.metadata(candidate.row).map(|m| m.title.clone()))
        .collect::<AppResult<Vec<String>>>()?;

    let enriched = match &state.enrichment {
        Some(fanout) => fanout.enrich(&titles).await,
        None => vec![None; titles.len()],
    };

    let mut items = assembler::assemble(&candidates, corpus.metadata_table(), &enriched)?;
    if options.include_searched {
        if let Some(searched) = items.first_mut() {
            searched.is_searched = true;
        }
    }

    tracing::info!(
        title = %title.trim(),
        row,
        results = items.len(),
        enriched = enriched.iter().filter(|e| e.is_some()).count(),
        "Recommendations assembled"
    );

    Ok(RecommendationResponse::found(items))
}

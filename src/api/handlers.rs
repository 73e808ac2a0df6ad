use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    corpus::SimilarityMode,
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::RecommendationResponse,
    services::recommendations::{self, RecommendOptions},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Default, Deserialize)]
pub struct RecommendParams {
    pub limit: Option<usize>,
    #[serde(default)]
    pub include_searched: bool,
}

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    pub movie_title: String,
    pub limit: Option<usize>,
    #[serde(default)]
    pub include_searched: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database_size: usize,
    pub dimensions: usize,
    pub similarity_mode: SimilarityMode,
    pub enrichment_enabled: bool,
    pub loaded_at: DateTime<Utc>,
}

// Handlers

/// Liveness and corpus size
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "online",
        database_size: state.corpus.len(),
        dimensions: state.corpus.dimensions(),
        similarity_mode: state.corpus.similarity_mode(),
        enrichment_enabled: state.enrichment.is_some(),
        loaded_at: state.corpus.loaded_at(),
    })
}

/// `GET /recommend/:title`
pub async fn recommend_by_path(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(title): Path<String>,
    Query(params): Query<RecommendParams>,
) -> AppResult<Json<RecommendationResponse>> {
    recommend(state, request_id, title, params).await
}

/// `GET /recommend?movie_title=...`
pub async fn recommend_by_query(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<RecommendQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let params = RecommendParams {
        limit: query.limit,
        include_searched: query.include_searched,
    };
    recommend(state, request_id, query.movie_title, params).await
}

async fn recommend(
    state: AppState,
    request_id: RequestId,
    title: String,
    params: RecommendParams,
) -> AppResult<Json<RecommendationResponse>> {
    let options = RecommendOptions {
        limit: resolve_limit(params.limit, state.settings.default_limit, state.settings.max_limit)?,
        include_searched: params.include_searched,
    };

    tracing::info!(
        request_id = %request_id,
        title = %title,
        limit = options.limit,
        "Processing recommendation request"
    );

    match recommendations::recommend(&state, &title, options).await {
        Ok(response) => Ok(Json(response)),
        Err(AppError::NotFound(title)) => {
            tracing::info!(request_id = %request_id, title = %title, "Movie not found");
            Ok(Json(RecommendationResponse::not_found()))
        }
        Err(e) => Err(e),
    }
}

fn resolve_limit(requested: Option<usize>, default: usize, max: usize) -> AppResult<usize> {
    match requested {
        None => Ok(default),
        Some(0) => Err(AppError::InvalidInput(
            "limit must be at least 1".to_string(),
        )),
        Some(limit) if limit > max => Err(AppError::InvalidInput(format!(
            "limit must be at most {}",
            max
        ))),
        Some(limit) => Ok(limit),
    }
}

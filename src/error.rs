use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::path::PathBuf;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Row {row} is outside the corpus (size {len})")]
    IndexOutOfRange { row: usize, len: usize },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::IndexOutOfRange { .. } | AppError::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Startup failure while loading the corpus artifacts.
///
/// The process must not serve traffic after any of these.
#[derive(thiserror::Error, Debug)]
pub enum CorpusLoadError {
    #[error("Artifact not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("Failed to read artifact {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed artifact {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("Invalid feature matrix: {0}")]
    InvalidMatrix(String),

    #[error("Row count mismatch: feature matrix has {matrix} rows, metadata has {metadata}")]
    RowCountMismatch { matrix: usize, metadata: usize },

    #[error("Title index entry '{title}' points at row {row}, corpus has {rows} rows")]
    TitleIndexOutOfRange {
        title: String,
        row: usize,
        rows: usize,
    },
}

use std::io::ErrorKind;
use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::{ApiError, GENERIC_SERVER_ERROR};
use crate::rag::RagError;
use crate::state::AppState;

/// `POST /api/corpus/reload`: re-read the corpus file after a rebuild.
///
/// A failed reload leaves the previous corpus serving requests.
pub async fn reload_corpus(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let handle = state.corpus();
    match handle.reload().await {
        Ok(corpus) => {
            tracing::info!(
                "Reloaded {} chunks from {}",
                corpus.len(),
                handle.source().display()
            );
            Ok(Json(json!({
                "status": "reloaded",
                "chunks": corpus.len(),
                "dimension": corpus.dimension(),
            })))
        }
        Err(RagError::Io { path, source }) if source.kind() == ErrorKind::NotFound => {
            tracing::warn!("Corpus file {} does not exist", path.display());
            Err(ApiError::NotFound("Corpus file not found.".to_string()))
        }
        Err(err) => {
            tracing::error!("Corpus reload failed: {}", err);
            Err(ApiError::Internal(GENERIC_SERVER_ERROR.to_string()))
        }
    }
}

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let corpus = state.corpus();
    let (snapshot, loaded_at) = corpus.snapshot_with_time().await;

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "started_at": state.started_at.to_rfc3339(),
        "corpus": {
            "source": corpus.source().display().to_string(),
            "chunks": snapshot.len(),
            "dimension": snapshot.dimension(),
            "loaded_at": loaded_at.to_rfc3339(),
        },
        "providers": {
            "embedding": state.query.embedder_name(),
            "generation": state.query.generator_name(),
        }
    }))
}

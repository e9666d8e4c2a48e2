use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::models::{SearchRequest, SearchResponse};
use crate::rag::pipeline;
use crate::state::AppState;

/// Retrieval cap per request, regardless of what the client asks for.
const MAX_TOP: usize = 20;

/// POST /api/search - run the retrieve step on its own and return the
/// documents, without generation.
pub async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let query = req.query.trim().to_string();
    if query.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Query is required".to_string()));
    }
    let top = req.top.clamp(1, MAX_TOP);

    let (backend, results) = pipeline::retrieve(&state, &query, top)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Search failed: {e:#}"),
            )
        })?;

    Ok(Json(SearchResponse {
        query,
        backend,
        results,
    }))
}

/// POST /api/search/reindex - re-chunk and re-embed the local docs
/// directory in the background.
pub async fn reindex(
    State(state): State<AppState>,
) -> (StatusCode, Json<serde_json::Value>) {
    let state_clone = state.clone();
    tokio::spawn(async move {
        match crate::rag::index_docs(&state_clone).await {
            Ok(count) => tracing::info!("Reindexed {count} documents"),
            Err(e) => tracing::error!("Document reindex failed: {e:#}"),
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "status": "indexing" })),
    )
}

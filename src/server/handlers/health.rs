use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "document_chunks": state.engine.document_count().await,
        "feedback_entries": state.engine.feedback_count().await,
        "generation": if state.generator.is_some() { "live" } else { "placeholder" },
    }))
}

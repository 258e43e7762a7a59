use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::core::errors::RagError;
use crate::server::types::{FeedbackListResponse, FeedbackRequest, FeedbackResponse};
use crate::state::AppState;

pub async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, RagError> {
    let entry = state
        .feedback
        .submit(
            &state.engine,
            state.embedder.as_ref(),
            &payload.query,
            &payload.response,
            &payload.updated_response,
            &payload.user_role,
        )
        .await?;

    Ok(Json(FeedbackResponse {
        success: true,
        entry,
    }))
}

pub async fn list_feedback(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FeedbackListResponse>, RagError> {
    let entries = state.feedback.entries().await?;
    Ok(Json(FeedbackListResponse { entries }))
}

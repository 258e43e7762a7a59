use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::core::errors::RagError;
use crate::llm::placeholder_answer;
use crate::retrieval::{EvidenceSet, UserRole};
use crate::server::types::{ChatRequest, ChatResponse, DocumentEvidence, FeedbackEvidence};
use crate::state::AppState;

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, RagError> {
    if payload.query.trim().is_empty() {
        return Err(RagError::BadRequest("query is required".to_string()));
    }
    let role = UserRole::parse(&payload.user_role)?;

    // An unreachable embedder degrades to an evidence-free answer instead of
    // failing the whole request.
    let evidence = match state.embedder.embed(&payload.query).await {
        Ok(vector) => {
            state
                .engine
                .retrieve_and_compose(&vector, state.engine.top_k())
                .await?
        }
        Err(RagError::EmbeddingUnavailable(reason)) => {
            tracing::warn!("Embedding unavailable, answering without retrieval: {reason}");
            EvidenceSet::default()
        }
        Err(err) => return Err(err),
    };

    let prompt = state
        .prompt_builder
        .build(&payload.query, &evidence, &payload.chat_history, role);

    let answer = match &state.generator {
        Some(generator) => match generator.generate(&prompt.system, &prompt.user).await {
            Ok(answer) => answer,
            Err(RagError::GenerationUnavailable(reason)) => {
                tracing::warn!("Generation unavailable, substituting placeholder: {reason}");
                placeholder_answer()
            }
            Err(err) => return Err(err),
        },
        None => placeholder_answer(),
    };

    let used_documents: Vec<DocumentEvidence> =
        evidence.documents().map(DocumentEvidence::from).collect();
    let applied_feedback: Vec<FeedbackEvidence> =
        evidence.feedback().map(FeedbackEvidence::from).collect();

    Ok(Json(ChatResponse {
        answer,
        used_documents,
        applied_feedback,
        prompt,
    }))
}

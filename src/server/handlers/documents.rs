use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use uuid::Uuid;

use crate::core::errors::RagError;
use crate::retrieval::DocumentChunk;
use crate::server::types::{IndexRequest, IndexResponse};
use crate::state::AppState;

/// Index pre-chunked text segments. Chunking itself happens upstream; this
/// endpoint embeds each segment and inserts it into the document index.
pub async fn index_documents(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<IndexRequest>,
) -> Result<Json<IndexResponse>, RagError> {
    if payload.segments.is_empty() {
        return Err(RagError::BadRequest("no segments provided".to_string()));
    }

    let mut indexed = 0;
    for segment in payload.segments {
        if segment.text.trim().is_empty() {
            continue;
        }

        let embedding = state.embedder.embed(&segment.text).await?;
        let chunk = DocumentChunk {
            id: Uuid::new_v4().to_string(),
            source: segment.source.unwrap_or_else(|| "upload".to_string()),
            text: segment.text,
        };
        state.engine.index_document(chunk, embedding).await?;
        indexed += 1;
    }

    tracing::info!(chunks = indexed, "documents indexed");

    Ok(Json(IndexResponse {
        success: true,
        chunks_indexed: indexed,
    }))
}

//! Request/response bodies for the HTTP surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::feedback::FeedbackEntry;
use crate::retrieval::{ChatTurn, PromptPayload, ScoredDocument, ScoredFeedback, UserRole};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    pub user_role: String,
    #[serde(default)]
    pub chat_history: Vec<ChatTurn>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub used_documents: Vec<DocumentEvidence>,
    pub applied_feedback: Vec<FeedbackEvidence>,
    /// The exact prompt handed to generation, for transparency.
    pub prompt: PromptPayload,
}

#[derive(Debug, Serialize)]
pub struct DocumentEvidence {
    pub source: String,
    pub content: String,
    pub score: f32,
}

impl From<&ScoredDocument> for DocumentEvidence {
    fn from(item: &ScoredDocument) -> Self {
        DocumentEvidence {
            source: item.chunk.source.clone(),
            content: item.chunk.text.clone(),
            score: item.final_score,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeedbackEvidence {
    pub id: Uuid,
    pub query: String,
    pub updated_response: String,
    pub user_role: UserRole,
    pub weight: f32,
    pub score: f32,
    pub created_at: DateTime<Utc>,
}

impl From<&ScoredFeedback> for FeedbackEvidence {
    fn from(item: &ScoredFeedback) -> Self {
        FeedbackEvidence {
            id: item.entry.id,
            query: item.entry.query.clone(),
            updated_response: item.entry.updated_response.clone(),
            user_role: item.entry.user_role,
            weight: item.role_boost,
            score: item.final_score,
            created_at: item.entry.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub query: String,
    pub response: String,
    pub user_role: String,
    pub updated_response: String,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub success: bool,
    pub entry: FeedbackEntry,
}

#[derive(Debug, Serialize)]
pub struct FeedbackListResponse {
    pub entries: Vec<FeedbackEntry>,
}

/// A pre-chunked text segment from the external ingestion step.
#[derive(Debug, Deserialize)]
pub struct DocumentSegment {
    pub source: Option<String>,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct IndexRequest {
    pub segments: Vec<DocumentSegment>,
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub success: bool,
    pub chunks_indexed: usize,
}

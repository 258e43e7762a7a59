//! Retrieval engine.
//!
//! Owns the two index instances and runs the query-side pipeline:
//! both indices are searched concurrently (they are disjoint state under
//! independent locks), hits are scored, and the composer produces the final
//! evidence set. Writes take the corresponding write lock, so each index is
//! single-writer, multiple-reader.

use tokio::sync::RwLock;

use crate::core::config::Settings;
use crate::core::errors::RagError;
use crate::feedback::FeedbackEntry;
use crate::index::VectorIndex;
use crate::retrieval::composer::{EvidenceComposer, EvidenceSet};
use crate::retrieval::scorer::RetrievalScorer;
use crate::retrieval::{DocumentChunk, RoleWeights};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub top_k: usize,
    pub max_evidence: usize,
    pub weights: RoleWeights,
}

impl EngineConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        EngineConfig {
            top_k: settings.top_k,
            max_evidence: settings.max_evidence,
            weights: settings.role_weights,
        }
    }
}

pub struct RetrievalEngine {
    dim: usize,
    top_k: usize,
    documents: RwLock<VectorIndex<DocumentChunk>>,
    feedback: RwLock<VectorIndex<FeedbackEntry>>,
    scorer: RetrievalScorer,
    composer: EvidenceComposer,
}

impl RetrievalEngine {
    pub fn new(dim: usize, config: EngineConfig) -> Self {
        RetrievalEngine {
            dim,
            top_k: config.top_k,
            documents: RwLock::new(VectorIndex::new(dim)),
            feedback: RwLock::new(VectorIndex::new(dim)),
            scorer: RetrievalScorer::new(config.weights),
            composer: EvidenceComposer::new(config.max_evidence),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn feedback_count(&self) -> usize {
        self.feedback.read().await.len()
    }

    pub async fn index_document(
        &self,
        chunk: DocumentChunk,
        embedding: Vec<f32>,
    ) -> Result<(), RagError> {
        let id = chunk.id.clone();
        self.documents.write().await.insert(&id, embedding, chunk)
    }

    pub async fn insert_feedback(
        &self,
        entry: FeedbackEntry,
        embedding: Vec<f32>,
    ) -> Result<(), RagError> {
        let id = entry.id.to_string();
        self.feedback.write().await.insert(&id, embedding, entry)
    }

    /// Query both indices with the same top-k, score, and merge.
    ///
    /// Pure with respect to index state: identical state and query vector
    /// always yield the identical ordered evidence set.
    pub async fn retrieve_and_compose(
        &self,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<EvidenceSet, RagError> {
        let (document_hits, feedback_hits) = tokio::join!(
            async { self.documents.read().await.query(query_vector, top_k) },
            async { self.feedback.read().await.query(query_vector, top_k) },
        );

        let documents = self.scorer.score_documents(document_hits?);
        let feedback = self.scorer.score_feedback(feedback_hits?);

        tracing::debug!(
            document_hits = documents.len(),
            feedback_hits = feedback.len(),
            "retrieval complete"
        );

        Ok(self.composer.compose(feedback, documents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::scorer::normalize_similarity;
    use crate::retrieval::UserRole;
    use chrono::Utc;
    use uuid::Uuid;

    fn engine() -> RetrievalEngine {
        RetrievalEngine::new(
            3,
            EngineConfig {
                top_k: 5,
                max_evidence: 6,
                weights: RoleWeights::default(),
            },
        )
    }

    fn entry(role: UserRole, query: &str, updated: &str) -> FeedbackEntry {
        FeedbackEntry {
            id: Uuid::new_v4(),
            query: query.to_string(),
            response: "original answer".to_string(),
            updated_response: updated.to_string(),
            user_role: role,
            created_at: Utc::now(),
        }
    }

    fn chunk(id: &str, text: &str) -> DocumentChunk {
        DocumentChunk {
            id: id.to_string(),
            source: "manual.txt".to_string(),
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn owner_feedback_alone_is_retrieved_with_boost() {
        let engine = engine();
        engine
            .insert_feedback(
                entry(UserRole::Owner, "reset password", "Use portal X"),
                vec![1.0, 0.0, 0.0],
            )
            .await
            .unwrap();

        let set = engine
            .retrieve_and_compose(&[1.0, 0.0, 0.0], 5)
            .await
            .unwrap();

        assert_eq!(set.items.len(), 1);
        let feedback = set.feedback().next().unwrap();
        assert_eq!(feedback.entry.updated_response, "Use portal X");
        assert!((feedback.role_boost - 2.0).abs() < 1e-6);
        let expected = normalize_similarity(1.0) * 2.0;
        assert!((feedback.final_score - expected).abs() < 1e-5);
        assert_eq!(set.documents().count(), 0);
    }

    #[tokio::test]
    async fn feedback_precedes_document_at_equal_similarity() {
        let engine = engine();
        engine
            .index_document(chunk("d1", "password doc"), vec![1.0, 0.0, 0.0])
            .await
            .unwrap();
        engine
            .insert_feedback(
                entry(UserRole::Driver, "reset password", "Ask dispatch first"),
                vec![1.0, 0.0, 0.0],
            )
            .await
            .unwrap();

        let set = engine
            .retrieve_and_compose(&[1.0, 0.0, 0.0], 5)
            .await
            .unwrap();

        assert_eq!(set.items.len(), 2);
        assert!(set.items[0].is_feedback());
        assert!(!set.items[1].is_feedback());
    }

    #[tokio::test]
    async fn empty_indices_yield_empty_evidence() {
        let engine = engine();
        let set = engine
            .retrieve_and_compose(&[0.0, 1.0, 0.0], 5)
            .await
            .unwrap();
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn retrieval_is_deterministic() {
        let engine = engine();
        for i in 0..4 {
            engine
                .index_document(
                    chunk(&format!("d{i}"), &format!("chunk {i}")),
                    vec![1.0, i as f32 * 0.1, 0.0],
                )
                .await
                .unwrap();
        }
        engine
            .insert_feedback(
                entry(UserRole::Manager, "q", "correction"),
                vec![1.0, 0.2, 0.0],
            )
            .await
            .unwrap();

        let first = engine
            .retrieve_and_compose(&[1.0, 0.1, 0.0], 5)
            .await
            .unwrap();
        let second = engine
            .retrieve_and_compose(&[1.0, 0.1, 0.0], 5)
            .await
            .unwrap();

        let contents =
            |set: &EvidenceSet| -> Vec<String> {
                set.items
                    .iter()
                    .map(|item| item.content().to_string())
                    .collect()
            };
        assert_eq!(contents(&first), contents(&second));
    }

    #[tokio::test]
    async fn query_dimension_mismatch_is_surfaced() {
        let engine = engine();
        let err = engine.retrieve_and_compose(&[1.0, 0.0], 5).await.unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { .. }));
    }
}

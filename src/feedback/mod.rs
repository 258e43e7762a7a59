//! Feedback ingestion.
//!
//! Corrections are validated, embedded, appended to the durable log, and
//! only then inserted into the feedback index. The index is a rebuildable
//! cache: startup replays the log into a fresh index before any query runs.

mod store;

pub use store::{FeedbackRecord, FeedbackStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::errors::RagError;
use crate::embed::Embedder;
use crate::retrieval::{RetrievalEngine, UserRole};

/// A human-submitted correction. Immutable after creation; a newer
/// correction is a new entry, never an edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub id: Uuid,
    /// The question the correction applies to. This is the text that gets
    /// embedded, so retrieval matches incoming questions against previously
    /// corrected ones.
    pub query: String,
    /// The model answer the submitter was correcting.
    pub response: String,
    /// The authoritative replacement answer.
    pub updated_response: String,
    pub user_role: UserRole,
    pub created_at: DateTime<Utc>,
}

pub struct FeedbackService {
    store: FeedbackStore,
}

impl FeedbackService {
    pub fn new(store: FeedbackStore) -> Self {
        FeedbackService { store }
    }

    /// Validate and persist a correction, then index it.
    ///
    /// Validation happens before any write, so a rejected submission leaves
    /// both the store and the index untouched. The store append commits
    /// before the index insert; a crash in between leaves an orphan log
    /// record that the next startup replay folds back in.
    pub async fn submit(
        &self,
        engine: &RetrievalEngine,
        embedder: &dyn Embedder,
        query: &str,
        response: &str,
        updated_response: &str,
        user_role: &str,
    ) -> Result<FeedbackEntry, RagError> {
        let role = UserRole::parse(user_role)?;
        if updated_response.trim().is_empty() {
            return Err(RagError::EmptyCorrection);
        }
        if query.trim().is_empty() {
            return Err(RagError::BadRequest("query is required".to_string()));
        }

        let embedding = embedder.embed(query).await?;

        let entry = FeedbackEntry {
            id: Uuid::new_v4(),
            query: query.to_string(),
            response: response.to_string(),
            updated_response: updated_response.to_string(),
            user_role: role,
            created_at: Utc::now(),
        };

        self.store.append(&entry, &embedding).await?;
        engine.insert_feedback(entry.clone(), embedding).await?;

        tracing::info!(
            role = %entry.user_role,
            id = %entry.id,
            "feedback ingested"
        );

        Ok(entry)
    }

    /// Replay the durable log into the engine's feedback index.
    ///
    /// Runs once at startup before the server accepts requests. Rows the
    /// store already flagged as corrupt are gone by this point; rows that
    /// fail to insert (duplicate id, dimension drift) are logged and skipped
    /// rather than aborting the whole rebuild.
    pub async fn rebuild(&self, engine: &RetrievalEngine) -> Result<usize, RagError> {
        let records = self.store.replay().await?;
        let mut restored = 0;

        for record in records {
            let id = record.entry.id;
            match engine.insert_feedback(record.entry, record.embedding).await {
                Ok(()) => restored += 1,
                Err(err) => {
                    tracing::warn!("Skipping feedback record {} during rebuild: {}", id, err);
                }
            }
        }

        Ok(restored)
    }

    pub async fn entries(&self) -> Result<Vec<FeedbackEntry>, RagError> {
        Ok(self
            .store
            .replay()
            .await?
            .into_iter()
            .map(|record| record.entry)
            .collect())
    }

    pub async fn count(&self) -> Result<usize, RagError> {
        self.store.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::testing::StubEmbedder;
    use crate::retrieval::{EngineConfig, RoleWeights};

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

    async fn service() -> FeedbackService {
        let tmp = std::env::temp_dir().join(format!("fleetrag-svc-{}.db", Uuid::new_v4()));
        FeedbackService::new(FeedbackStore::open(tmp).await.unwrap())
    }

    #[tokio::test]
    async fn invalid_role_leaves_store_and_index_unchanged() {
        let service = service().await;
        let engine = engine();
        let embedder = StubEmbedder::new(3);

        let err = service
            .submit(
                &engine,
                &embedder,
                "reset password",
                "old",
                "Use portal X",
                "supervisor",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RagError::InvalidRole(_)));
        assert_eq!(service.count().await.unwrap(), 0);
        assert_eq!(engine.feedback_count().await, 0);
    }

    #[tokio::test]
    async fn empty_correction_is_rejected_before_any_write() {
        let service = service().await;
        let engine = engine();
        let embedder = StubEmbedder::new(3);

        let err = service
            .submit(&engine, &embedder, "reset password", "old", "   ", "owner")
            .await
            .unwrap_err();

        assert!(matches!(err, RagError::EmptyCorrection));
        assert_eq!(service.count().await.unwrap(), 0);
        assert_eq!(engine.feedback_count().await, 0);
    }

    #[tokio::test]
    async fn embedding_failure_writes_nothing() {
        let service = service().await;
        let engine = engine();
        let mut embedder = StubEmbedder::new(3);
        embedder.fail = true;

        let err = service
            .submit(&engine, &embedder, "q", "old", "corrected", "driver")
            .await
            .unwrap_err();

        assert!(matches!(err, RagError::EmbeddingUnavailable(_)));
        assert_eq!(service.count().await.unwrap(), 0);
        assert_eq!(engine.feedback_count().await, 0);
    }

    #[tokio::test]
    async fn submit_persists_and_indexes() {
        let service = service().await;
        let engine = engine();
        let embedder = StubEmbedder::new(3).with("reset password", vec![1.0, 0.0, 0.0]);

        let entry = service
            .submit(
                &engine,
                &embedder,
                "reset password",
                "old answer",
                "Use portal X",
                "owner",
            )
            .await
            .unwrap();

        assert_eq!(entry.user_role, UserRole::Owner);
        assert_eq!(service.count().await.unwrap(), 1);
        assert_eq!(engine.feedback_count().await, 1);

        let set = engine
            .retrieve_and_compose(&[1.0, 0.0, 0.0], 5)
            .await
            .unwrap();
        assert_eq!(set.feedback().count(), 1);
    }

    #[tokio::test]
    async fn rebuild_restores_the_same_topk_results() {
        let service = service().await;
        let original = engine();
        let embedder = StubEmbedder::new(3)
            .with("reset password", vec![1.0, 0.0, 0.0])
            .with("fuel card pin", vec![0.0, 1.0, 0.0])
            .with("trailer hitch check", vec![0.0, 0.0, 1.0]);

        for (query, updated, role) in [
            ("reset password", "Use portal X", "owner"),
            ("fuel card pin", "Call the office", "manager"),
            ("trailer hitch check", "Follow checklist B", "driver"),
        ] {
            service
                .submit(&original, &embedder, query, "old", updated, role)
                .await
                .unwrap();
        }

        let restarted = engine();
        let restored = service.rebuild(&restarted).await.unwrap();
        assert_eq!(restored, 3);

        for probe in [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.5, 0.5, 0.0]] {
            let before = original.retrieve_and_compose(&probe, 5).await.unwrap();
            let after = restarted.retrieve_and_compose(&probe, 5).await.unwrap();

            let ids = |set: &crate::retrieval::EvidenceSet| -> Vec<Uuid> {
                set.feedback().map(|item| item.entry.id).collect()
            };
            assert_eq!(ids(&before), ids(&after));
        }
    }
}

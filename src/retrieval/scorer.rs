//! Scoring of raw index hits.
//!
//! Document hits keep their normalized similarity. Feedback hits multiply it
//! by the submitter's role weight, so higher-trust corrections outrank raw
//! source material by construction.

use serde::Serialize;

use crate::feedback::FeedbackEntry;
use crate::index::SearchHit;
use crate::retrieval::{DocumentChunk, RoleWeights, UserRole};

/// Map cosine similarity from [-1, 1] onto [0, 1] so document and feedback
/// scores share a scale before the boost is applied.
pub fn normalize_similarity(cosine: f32) -> f32 {
    (1.0 + cosine.clamp(-1.0, 1.0)) / 2.0
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredDocument {
    pub chunk: DocumentChunk,
    pub raw_similarity: f32,
    pub final_score: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredFeedback {
    pub entry: FeedbackEntry,
    pub raw_similarity: f32,
    pub role_boost: f32,
    pub final_score: f32,
}

pub struct RetrievalScorer {
    weights: RoleWeights,
}

impl RetrievalScorer {
    pub fn new(weights: RoleWeights) -> Self {
        RetrievalScorer { weights }
    }

    pub fn weight(&self, role: UserRole) -> f32 {
        self.weights.weight(role)
    }

    pub fn score_documents(&self, hits: Vec<SearchHit<DocumentChunk>>) -> Vec<ScoredDocument> {
        hits.into_iter()
            .map(|hit| ScoredDocument {
                raw_similarity: hit.similarity,
                final_score: normalize_similarity(hit.similarity),
                chunk: hit.payload,
            })
            .collect()
    }

    pub fn score_feedback(&self, hits: Vec<SearchHit<FeedbackEntry>>) -> Vec<ScoredFeedback> {
        hits.into_iter()
            .map(|hit| {
                let boost = self.weights.weight(hit.payload.user_role);
                ScoredFeedback {
                    raw_similarity: hit.similarity,
                    role_boost: boost,
                    final_score: normalize_similarity(hit.similarity) * boost,
                    entry: hit.payload,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn hit(role: UserRole, similarity: f32) -> SearchHit<FeedbackEntry> {
        SearchHit {
            payload: FeedbackEntry {
                id: Uuid::new_v4(),
                query: "q".to_string(),
                response: "r".to_string(),
                updated_response: "u".to_string(),
                user_role: role,
                created_at: Utc::now(),
            },
            similarity,
        }
    }

    #[test]
    fn normalization_maps_cosine_onto_unit_interval() {
        assert!((normalize_similarity(1.0) - 1.0).abs() < 1e-6);
        assert!((normalize_similarity(-1.0)).abs() < 1e-6);
        assert!((normalize_similarity(0.0) - 0.5).abs() < 1e-6);
        // Out-of-range input from accumulated float error is clamped.
        assert!((normalize_similarity(1.2) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn boost_is_monotonic_in_role_at_equal_similarity() {
        let scorer = RetrievalScorer::new(RoleWeights::default());
        let scored = scorer.score_feedback(vec![
            hit(UserRole::Driver, 0.6),
            hit(UserRole::Manager, 0.6),
            hit(UserRole::Owner, 0.6),
        ]);

        assert!(scored[0].final_score < scored[1].final_score);
        assert!(scored[1].final_score < scored[2].final_score);
    }

    #[test]
    fn feedback_never_scores_below_equivalent_document() {
        let scorer = RetrievalScorer::new(RoleWeights::default());
        for similarity in [-0.5_f32, 0.0, 0.4, 0.9] {
            let feedback = scorer.score_feedback(vec![hit(UserRole::Driver, similarity)]);
            assert!(feedback[0].final_score >= normalize_similarity(similarity) - 1e-6);
        }
    }

    #[test]
    fn document_score_is_normalized_similarity() {
        let scorer = RetrievalScorer::new(RoleWeights::default());
        let scored = scorer.score_documents(vec![SearchHit {
            payload: DocumentChunk {
                id: "c1".to_string(),
                source: "manual.txt".to_string(),
                text: "text".to_string(),
            },
            similarity: 0.5,
        }]);
        assert!((scored[0].final_score - 0.75).abs() < 1e-6);
        assert!((scored[0].raw_similarity - 0.5).abs() < 1e-6);
    }
}

//! Evidence composition.
//!
//! Merges scored document and feedback hits into one ordered, capped list.
//! Feedback always precedes documents as a class; within a class the order is
//! final score descending with deterministic tie-breaks, so identical inputs
//! always produce the identical evidence set.

use std::collections::HashSet;

use crate::retrieval::scorer::{ScoredDocument, ScoredFeedback};

#[derive(Debug, Clone)]
pub enum Evidence {
    Feedback(ScoredFeedback),
    Document(ScoredDocument),
}

impl Evidence {
    pub fn is_feedback(&self) -> bool {
        matches!(self, Evidence::Feedback(_))
    }

    pub fn final_score(&self) -> f32 {
        match self {
            Evidence::Feedback(item) => item.final_score,
            Evidence::Document(item) => item.final_score,
        }
    }

    /// Text the evidence contributes to the prompt; also the dedupe key.
    pub fn content(&self) -> &str {
        match self {
            Evidence::Feedback(item) => &item.entry.updated_response,
            Evidence::Document(item) => &item.chunk.text,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EvidenceSet {
    pub items: Vec<Evidence>,
}

impl EvidenceSet {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn feedback(&self) -> impl Iterator<Item = &ScoredFeedback> {
        self.items.iter().filter_map(|item| match item {
            Evidence::Feedback(feedback) => Some(feedback),
            Evidence::Document(_) => None,
        })
    }

    pub fn documents(&self) -> impl Iterator<Item = &ScoredDocument> {
        self.items.iter().filter_map(|item| match item {
            Evidence::Document(document) => Some(document),
            Evidence::Feedback(_) => None,
        })
    }
}

pub struct EvidenceComposer {
    max_evidence: usize,
}

impl EvidenceComposer {
    pub fn new(max_evidence: usize) -> Self {
        EvidenceComposer { max_evidence }
    }

    pub fn compose(
        &self,
        mut feedback: Vec<ScoredFeedback>,
        mut documents: Vec<ScoredDocument>,
    ) -> EvidenceSet {
        // Score descending; ties broken by recency, then id, so the order is
        // a total order independent of input arrangement.
        feedback.sort_by(|a, b| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.entry.created_at.cmp(&a.entry.created_at))
                .then_with(|| a.entry.id.cmp(&b.entry.id))
        });
        documents.sort_by(|a, b| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });

        let merged = feedback
            .into_iter()
            .map(Evidence::Feedback)
            .chain(documents.into_iter().map(Evidence::Document));

        let mut seen: HashSet<String> = HashSet::new();
        let mut items = Vec::new();
        for item in merged {
            if items.len() >= self.max_evidence {
                break;
            }
            if seen.insert(item.content().to_string()) {
                items.push(item);
            }
        }

        EvidenceSet { items }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::FeedbackEntry;
    use crate::retrieval::{DocumentChunk, UserRole};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn feedback(id: u128, score: f32, text: &str, secs: i64) -> ScoredFeedback {
        ScoredFeedback {
            entry: FeedbackEntry {
                id: Uuid::from_u128(id),
                query: "q".to_string(),
                response: "r".to_string(),
                updated_response: text.to_string(),
                user_role: UserRole::Manager,
                created_at: Utc.timestamp_opt(secs, 0).unwrap(),
            },
            raw_similarity: score,
            role_boost: 1.5,
            final_score: score,
        }
    }

    fn document(id: &str, score: f32, text: &str) -> ScoredDocument {
        ScoredDocument {
            chunk: DocumentChunk {
                id: id.to_string(),
                source: "manual.txt".to_string(),
                text: text.to_string(),
            },
            raw_similarity: score,
            final_score: score,
        }
    }

    #[test]
    fn feedback_precedes_documents_regardless_of_score() {
        let composer = EvidenceComposer::new(10);
        let set = composer.compose(
            vec![feedback(1, 0.2, "low scoring correction", 0)],
            vec![document("d1", 0.9, "high scoring chunk")],
        );

        assert_eq!(set.items.len(), 2);
        assert!(set.items[0].is_feedback());
        assert!(!set.items[1].is_feedback());
    }

    #[test]
    fn exact_duplicate_content_is_collapsed() {
        let composer = EvidenceComposer::new(10);
        let set = composer.compose(
            vec![feedback(1, 0.8, "use portal x", 0)],
            vec![
                document("d1", 0.7, "use portal x"),
                document("d2", 0.6, "unrelated text"),
            ],
        );

        let contents: Vec<&str> = set.items.iter().map(Evidence::content).collect();
        assert_eq!(contents, vec!["use portal x", "unrelated text"]);
        assert!(set.items[0].is_feedback());
    }

    #[test]
    fn output_is_capped() {
        let composer = EvidenceComposer::new(3);
        let docs = (0..5)
            .map(|i| document(&format!("d{i}"), 0.5, &format!("chunk {i}")))
            .collect();
        let set = composer.compose(vec![feedback(1, 0.9, "correction", 0)], docs);
        assert_eq!(set.items.len(), 3);
    }

    #[test]
    fn newer_feedback_wins_score_ties() {
        let composer = EvidenceComposer::new(10);
        let set = composer.compose(
            vec![
                feedback(1, 0.5, "older", 100),
                feedback(2, 0.5, "newer", 200),
            ],
            Vec::new(),
        );

        let contents: Vec<&str> = set.items.iter().map(Evidence::content).collect();
        assert_eq!(contents, vec!["newer", "older"]);
    }

    #[test]
    fn composition_is_deterministic_under_input_order() {
        let composer = EvidenceComposer::new(10);
        let fb = vec![
            feedback(1, 0.5, "a", 100),
            feedback(2, 0.7, "b", 100),
            feedback(3, 0.5, "c", 100),
        ];
        let docs = vec![document("d1", 0.4, "x"), document("d2", 0.4, "y")];

        let first = composer.compose(fb.clone(), docs.clone());
        let mut reversed_fb = fb;
        reversed_fb.reverse();
        let mut reversed_docs = docs;
        reversed_docs.reverse();
        let second = composer.compose(reversed_fb, reversed_docs);

        let order = |set: &EvidenceSet| -> Vec<String> {
            set.items
                .iter()
                .map(|item| item.content().to_string())
                .collect()
        };
        assert_eq!(order(&first), order(&second));
    }
}

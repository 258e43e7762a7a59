//! In-memory vector index.
//!
//! Brute-force cosine similarity over a fixed-dimension entry set. Both the
//! document index and the feedback index are instances of the same
//! `VectorIndex`, constructed with the same dimensionality, so their scores
//! live on a common scale.

use std::collections::HashMap;

use crate::core::errors::RagError;

/// A query hit: the stored payload and its cosine similarity to the query
/// vector (larger = more similar).
#[derive(Debug, Clone)]
pub struct SearchHit<P> {
    pub payload: P,
    pub similarity: f32,
}

struct IndexEntry<P> {
    vector: Vec<f32>,
    payload: P,
}

pub struct VectorIndex<P> {
    dim: usize,
    entries: Vec<IndexEntry<P>>,
    ids: HashMap<String, usize>,
}

impl<P: Clone> VectorIndex<P> {
    pub fn new(dim: usize) -> Self {
        VectorIndex {
            dim,
            entries: Vec::new(),
            ids: HashMap::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    /// Add an entry. Re-inserting an existing id is rejected rather than
    /// overwritten so a double write shows up as an error in the logs.
    pub fn insert(&mut self, id: &str, vector: Vec<f32>, payload: P) -> Result<(), RagError> {
        if vector.len() != self.dim {
            return Err(RagError::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        if self.ids.contains_key(id) {
            return Err(RagError::DuplicateId(id.to_string()));
        }

        self.ids.insert(id.to_string(), self.entries.len());
        self.entries.push(IndexEntry { vector, payload });
        Ok(())
    }

    /// Top-k nearest entries by cosine similarity, best first. An empty index
    /// yields an empty list, not an error. Equal similarities keep insertion
    /// order (the sort is stable), so results are reproducible run-over-run.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit<P>>, RagError> {
        if vector.len() != self.dim {
            return Err(RagError::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        if k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<SearchHit<P>> = self
            .entries
            .iter()
            .map(|entry| SearchHit {
                payload: entry.payload.clone(),
                similarity: cosine_similarity(vector, &entry.vector),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);

        Ok(hits)
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        dot / denom
    }
}

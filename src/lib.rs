//! Feedback-weighted retrieval backend.
//!
//! Retrieves evidence for a question from two parallel vector indices (one
//! over document chunks, one over human corrections), boosts feedback hits by
//! the submitter's trust role, and hands the merged evidence to a generation
//! model. The feedback index is rebuilt from a durable log on every start.

pub mod core;
pub mod embed;
pub mod feedback;
pub mod index;
pub mod llm;
pub mod retrieval;
pub mod server;
pub mod state;

//! Prompt serialization.
//!
//! Turns an evidence set plus conversation history into the generation
//! input. Feedback-derived evidence is rendered before document-derived
//! evidence as a class; when nothing was retrieved the prompt says so
//! explicitly instead of silently omitting the sections.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::retrieval::composer::EvidenceSet;
use crate::retrieval::{RoleWeights, UserRole};

const SYSTEM_PROMPT: &str = "You are an AI assistant helping a logistics company answer questions \
based on internal documents and user feedback. User feedback captures corrections from subject \
matter experts and should be treated as authoritative. When multiple feedback entries conflict, \
prefer the one provided by the highest weighted role. Roles have the following priority from \
lowest to highest authority: driver, manager, owner.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One prior conversation turn, supplied by the caller with each request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

/// The fully serialized generation input.
#[derive(Debug, Clone, Serialize)]
pub struct PromptPayload {
    pub system: String,
    pub user: String,
}

pub struct PromptBuilder {
    weights: RoleWeights,
}

impl PromptBuilder {
    pub fn new(weights: RoleWeights) -> Self {
        PromptBuilder { weights }
    }

    pub fn build(
        &self,
        question: &str,
        evidence: &EvidenceSet,
        history: &[ChatTurn],
        user_role: UserRole,
    ) -> PromptPayload {
        let mut user = String::new();

        let _ = writeln!(
            user,
            "The active user role is {} with weight {:.1}.",
            user_role,
            self.weights.weight(user_role)
        );

        user.push_str("\nChat history:\n");
        if history.is_empty() {
            user.push_str("No previous conversation.\n");
        } else {
            for turn in history {
                let prefix = match turn.role {
                    TurnRole::User => "User",
                    TurnRole::Assistant => "Assistant",
                };
                let _ = writeln!(user, "{}: {}", prefix, turn.content);
            }
        }

        user.push_str("\nRelevant user feedback (highest priority first):\n");
        let mut any_feedback = false;
        for item in evidence.feedback() {
            any_feedback = true;
            let _ = writeln!(
                user,
                "Role: {} (weight {:.1}, score {:.2})\nOriginal query: {}\nUpdated response:\n{}\n",
                item.entry.user_role,
                item.role_boost,
                item.final_score,
                item.entry.query,
                item.entry.updated_response,
            );
        }
        if !any_feedback {
            user.push_str("No user feedback matched the query.\n");
        }

        user.push_str("\nRetrieved documents:\n");
        let mut any_documents = false;
        for (i, item) in evidence.documents().enumerate() {
            any_documents = true;
            let _ = writeln!(
                user,
                "Document {} (source: {}, score {:.2})\n{}\n",
                i + 1,
                item.chunk.source,
                item.final_score,
                item.chunk.text,
            );
        }
        if !any_documents {
            user.push_str("No retrieved documents.\n");
        }

        if evidence.is_empty() {
            user.push_str(
                "\nNo internal evidence was retrieved for this question. \
                 Answer from general knowledge and say so.\n",
            );
        } else {
            user.push_str(
                "\nInstructions: Integrate the user feedback into your answer. Use the highest \
                 priority feedback as the authoritative source. If feedback contradicts documents, \
                 follow the feedback with the highest role weight. Provide a concise answer that \
                 references the relevant steps.\n",
            );
        }

        let _ = write!(user, "\nUser question: {question}");

        PromptPayload {
            system: SYSTEM_PROMPT.to_string(),
            user,
        }
    }
}

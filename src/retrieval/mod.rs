//! Feedback-weighted retrieval.
//!
//! This module is the heart of the system: it queries the document and
//! feedback indices, boosts feedback hits by the submitter's trust role,
//! merges everything into a capped, deterministically ordered evidence set,
//! and serializes that evidence into a generation prompt.

mod composer;
mod engine;
mod prompt;
mod scorer;

pub use composer::{Evidence, EvidenceComposer, EvidenceSet};
pub use engine::{EngineConfig, RetrievalEngine};
pub use prompt::{ChatTurn, PromptBuilder, PromptPayload, TurnRole};
pub use scorer::{normalize_similarity, RetrievalScorer, ScoredDocument, ScoredFeedback};

use serde::{Deserialize, Serialize};

use crate::core::errors::RagError;

/// An indexed text segment from an uploaded document. Immutable once
/// indexed; the embedding lives in the document index, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub source: String,
    pub text: String,
}

/// Trust tier of a feedback submitter, ordered by authority.
///
/// The ordering is load-bearing: role boosts must be strictly increasing
/// along `Driver < Manager < Owner`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Driver,
    Manager,
    Owner,
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [UserRole::Driver, UserRole::Manager, UserRole::Owner];

    pub fn parse(value: &str) -> Result<Self, RagError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "driver" => Ok(UserRole::Driver),
            "manager" => Ok(UserRole::Manager),
            "owner" => Ok(UserRole::Owner),
            other => Err(RagError::InvalidRole(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Driver => "driver",
            UserRole::Manager => "manager",
            UserRole::Owner => "owner",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Multiplicative boost applied to a feedback hit's normalized similarity.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RoleWeights {
    pub driver: f32,
    pub manager: f32,
    pub owner: f32,
}

impl Default for RoleWeights {
    fn default() -> Self {
        RoleWeights {
            driver: 1.0,
            manager: 1.5,
            owner: 2.0,
        }
    }
}

impl RoleWeights {
    pub fn weight(&self, role: UserRole) -> f32 {
        match role {
            UserRole::Driver => self.driver,
            UserRole::Manager => self.manager,
            UserRole::Owner => self.owner,
        }
    }

    /// Weights below 1.0 would let a boosted feedback hit rank under an
    /// unboosted document hit at the same similarity; non-increasing weights
    /// would break the trust ordering. Both are configuration errors.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.driver < 1.0 {
            return Err(RagError::BadRequest(
                "role_weights.driver must be at least 1.0".to_string(),
            ));
        }
        if !(self.driver < self.manager && self.manager < self.owner) {
            return Err(RagError::BadRequest(
                "role weights must be strictly increasing: driver < manager < owner".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_are_ordered_by_authority() {
        assert!(UserRole::Driver < UserRole::Manager);
        assert!(UserRole::Manager < UserRole::Owner);
    }

    #[test]
    fn parse_accepts_the_three_roles() {
        assert_eq!(UserRole::parse("owner").unwrap(), UserRole::Owner);
        assert_eq!(UserRole::parse(" Manager ").unwrap(), UserRole::Manager);
        assert!(matches!(
            UserRole::parse("supervisor"),
            Err(RagError::InvalidRole(_))
        ));
    }

    #[test]
    fn default_weights_are_monotonic() {
        let weights = RoleWeights::default();
        weights.validate().unwrap();
        assert!(weights.weight(UserRole::Driver) < weights.weight(UserRole::Manager));
        assert!(weights.weight(UserRole::Manager) < weights.weight(UserRole::Owner));
    }

    #[test]
    fn sub_unit_driver_weight_rejected() {
        let weights = RoleWeights {
            driver: 0.5,
            manager: 1.5,
            owner: 2.0,
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn role_serde_round_trip_is_lowercase() {
        let json = serde_json::to_string(&UserRole::Owner).unwrap();
        assert_eq!(json, "\"owner\"");
        let back: UserRole = serde_json::from_str("\"driver\"").unwrap();
        assert_eq!(back, UserRole::Driver);
    }
}

//! Runtime settings.
//!
//! Loaded from an optional `fleetrag.toml` in the data directory, then
//! overridden by environment variables. Role weights are validated at load
//! time so a bad table can never reach the scorer.

mod paths;

pub use paths::AppPaths;

use std::env;
use std::fs;

use serde::Deserialize;

use crate::core::errors::RagError;
use crate::retrieval::RoleWeights;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Port to bind; 0 picks an ephemeral port.
    pub port: u16,
    /// Top-k used against each index per query.
    pub top_k: usize,
    /// Cap on the merged evidence list handed to the prompt.
    pub max_evidence: usize,
    /// Fixed dimensionality both indices are constructed with.
    pub embedding_dim: usize,
    /// Timeout applied to embedding and generation calls.
    pub request_timeout_secs: u64,
    pub embedding_base_url: String,
    pub embedding_model: String,
    pub generation_base_url: String,
    pub generation_model: String,
    pub openai_api_key: Option<String>,
    pub role_weights: RoleWeights,
    pub allowed_origins: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            port: 0,
            top_k: 5,
            max_evidence: 6,
            embedding_dim: 384,
            request_timeout_secs: 30,
            embedding_base_url: "http://127.0.0.1:8080".to_string(),
            embedding_model: "all-MiniLM-L6-v2".to_string(),
            generation_base_url: "https://api.openai.com".to_string(),
            generation_model: "gpt-4.1-mini".to_string(),
            openai_api_key: None,
            role_weights: RoleWeights::default(),
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
        }
    }
}

impl Settings {
    pub fn load(paths: &AppPaths) -> Result<Self, RagError> {
        let mut settings = if paths.config_path.exists() {
            let raw = fs::read_to_string(&paths.config_path).map_err(RagError::internal)?;
            toml::from_str::<Settings>(&raw)
                .map_err(|err| RagError::BadRequest(format!("invalid fleetrag.toml: {err}")))?
        } else {
            Settings::default()
        };

        settings.apply_env();
        settings.validate()?;
        Ok(settings)
    }

    fn apply_env(&mut self) {
        if let Some(port) = env::var("PORT").ok().and_then(|v| v.parse().ok()) {
            self.port = port;
        }
        if let Ok(url) = env::var("EMBEDDING_BASE_URL") {
            self.embedding_base_url = url;
        }
        if let Ok(url) = env::var("OPENAI_BASE_URL") {
            self.generation_base_url = url;
        }
        if let Ok(model) = env::var("OPENAI_MODEL") {
            self.generation_model = model;
        }
        if let Ok(key) = env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                self.openai_api_key = Some(key);
            }
        }
    }

    fn validate(&self) -> Result<(), RagError> {
        if self.embedding_dim == 0 {
            return Err(RagError::BadRequest(
                "embedding_dim must be positive".to_string(),
            ));
        }
        if self.top_k == 0 || self.max_evidence == 0 {
            return Err(RagError::BadRequest(
                "top_k and max_evidence must be positive".to_string(),
            ));
        }
        self.role_weights.validate()
    }
}

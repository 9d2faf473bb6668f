use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::errors::EngineError;
use crate::llm_client::embedding::DEFAULT_DIMENSION;

const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// Process configuration loaded from environment variables.
///
/// Nothing is required: without `ANTHROPIC_API_KEY` the binary runs offline
/// with rules-only extraction.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: Option<String>,
    pub embedding_dimension: usize,
    pub embedding_cache_capacity: usize,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            embedding_dimension: parse_env("EMBEDDING_DIMENSION", DEFAULT_DIMENSION)?,
            embedding_cache_capacity: parse_env("EMBEDDING_CACHE_CAPACITY", DEFAULT_CACHE_CAPACITY)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn parse_env(key: &str, default: usize) -> Result<usize> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<usize>()
            .with_context(|| format!("{key} must be a positive integer, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

/// Per-call scoring knobs. Every field is optional in JSON; missing fields
/// take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    /// Similarity at or above which a must-have counts as matched.
    pub must_have_threshold: f32,
    pub nice_to_have_threshold: f32,
    /// Weight given to nice-to-have requirements. Must-haves weigh 1.0.
    pub nice_to_have_weight: f32,
    /// Upper bound on the missing must-have penalty, in score points.
    pub must_have_penalty_cap: f64,
    pub must_have_penalty_per_miss: f64,
    /// Deadline for each external call (model extraction, embeddings).
    pub provider_timeout_ms: u64,
    /// Matched requirements below this similarity still get feedback.
    pub low_similarity_threshold: f32,
    /// Ask the model to adjust requirement weights (±0.2).
    pub refine_weights: bool,
    /// Send unresolved resume spans to the model. Off means rules only.
    pub model_extraction: bool,
    /// Ask the model for rewrites of weak resume lines after scoring.
    pub suggest_edits: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            must_have_threshold: 0.6,
            nice_to_have_threshold: 0.5,
            nice_to_have_weight: 0.4,
            must_have_penalty_cap: 15.0,
            must_have_penalty_per_miss: 5.0,
            provider_timeout_ms: 10_000,
            low_similarity_threshold: 0.5,
            refine_weights: false,
            model_extraction: true,
            suggest_edits: false,
        }
    }
}

impl ScoringConfig {
    /// Defaults with model calls switched off.
    pub fn rules_only() -> Self {
        Self {
            model_extraction: false,
            refine_weights: false,
            suggest_edits: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let unit = |name: &str, value: f32| {
            if value.is_finite() && (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(EngineError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )))
            }
        };
        unit("must_have_threshold", self.must_have_threshold)?;
        unit("nice_to_have_threshold", self.nice_to_have_threshold)?;
        unit("low_similarity_threshold", self.low_similarity_threshold)?;

        if !(self.nice_to_have_weight > 0.0 && self.nice_to_have_weight <= 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "nice_to_have_weight must be within (0, 1], got {}",
                self.nice_to_have_weight
            )));
        }
        for (name, value) in [
            ("must_have_penalty_cap", self.must_have_penalty_cap),
            ("must_have_penalty_per_miss", self.must_have_penalty_per_miss),
        ] {
            if !(value.is_finite() && (0.0..=100.0).contains(&value)) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be within [0, 100], got {value}"
                )));
            }
        }
        if self.provider_timeout_ms == 0 {
            return Err(EngineError::InvalidConfig(
                "provider_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

//! ATS matching and scoring engine.
//!
//! Parses a resume and a job description, matches the candidate's profile
//! against the job's requirements and returns an explainable 0–100 score with
//! feedback, optionally followed by model-written edits for weak resume lines.
//! Model access goes through the injected `LanguageModelClient`.

pub mod config;
pub mod engine;
pub mod errors;
pub mod extraction;
pub mod feedback;
pub mod llm_client;
pub mod matching;
pub mod models;
pub mod normalizer;
pub mod quality;
pub mod requirements;
pub mod scoring;
pub mod suggestions;

pub use config::{Config, ScoringConfig};
pub use engine::{AtsEngine, ParseOutput};
pub use errors::EngineError;
pub use llm_client::{AnthropicClient, HashEmbedder, LanguageModelClient, LocalClient, ProviderError};
pub use matching::{EmbeddingCache, LruEmbeddingCache, NoCache};
pub use models::{DocumentKind, ScoreReport};

//! Structured Extractor: resume `Document` → `ExtractedProfile`.
//!
//! Two strategies behind one entry point. The rule pass always runs; the
//! model pass only sees what the rules left unresolved, and only when
//! `model_extraction` is enabled.

pub mod dates;
pub mod model;
pub mod prompts;
pub mod rules;
pub mod taxonomy;

use tracing::{info, warn};

use crate::config::ScoringConfig;
use crate::errors::EngineError;
use crate::llm_client::LanguageModelClient;
use crate::models::{Document, ExtractedProfile};

pub use rules::{ResidualKind, ResidualSpan, ResumeSection};

/// Spans beyond this are left unresolved rather than sent.
const MAX_RESIDUAL_SPANS: usize = 40;

pub fn extract_profile_rules_only(document: &Document) -> ExtractedProfile {
    rules::extract(document).profile
}

/// Rules first, then one batched model call for the residue.
///
/// A model answer that stays malformed after the stricter retry fails the
/// whole extraction with `EngineError::Extraction`; the caller decides
/// whether to fall back to `extract_profile_rules_only`.
pub async fn extract_profile(
    document: &Document,
    client: &dyn LanguageModelClient,
    config: &ScoringConfig,
) -> Result<ExtractedProfile, EngineError> {
    let rules::RuleExtraction {
        mut profile,
        mut residual,
    } = rules::extract(document);

    info!(
        skills = profile.skills.len(),
        experiences = profile.experiences.len(),
        residual = residual.len(),
        "rule-based extraction complete"
    );

    if !config.model_extraction || residual.is_empty() {
        return Ok(profile);
    }

    if residual.len() > MAX_RESIDUAL_SPANS {
        warn!(
            total = residual.len(),
            sent = MAX_RESIDUAL_SPANS,
            "too many unresolved spans, truncating model request"
        );
        residual.truncate(MAX_RESIDUAL_SPANS);
    }

    let extraction = model::extract_residual(client, &residual, config.provider_timeout_ms).await?;
    model::merge(&mut profile, &residual, extraction, document);

    info!(
        skills = profile.skills.len(),
        experiences = profile.experiences.len(),
        client = client.name(),
        "model-assisted extraction merged"
    );
    Ok(profile)
}

//! Public entry points: `AtsEngine::parse` and `AtsEngine::score`.
//!
//! The engine holds only the injected client and embedding cache. Everything
//! else arrives per call, so one engine serves concurrent requests with
//! different configs.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument};

use crate::config::ScoringConfig;
use crate::errors::EngineError;
use crate::extraction::extract_profile;
use crate::feedback::generate_feedback;
use crate::llm_client::LanguageModelClient;
use crate::matching::{match_requirements, EmbeddingCache, Embeddings, NoCache};
use crate::models::{Document, DocumentKind, ExtractedProfile, RequirementSet, ScoreReport};
use crate::normalizer::normalize;
use crate::quality::review_resume;
use crate::requirements::extract_requirements;
use crate::scoring::aggregate;
use crate::suggestions::suggest_edits;

/// Result of `AtsEngine::parse`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseOutput {
    Resume {
        document: Document,
        profile: ExtractedProfile,
    },
    JobDescription {
        document: Document,
        requirements: RequirementSet,
    },
}

#[derive(Clone)]
pub struct AtsEngine {
    client: Arc<dyn LanguageModelClient>,
    cache: Arc<dyn EmbeddingCache>,
}

impl AtsEngine {
    /// Engine without an embedding cache.
    pub fn new(client: Arc<dyn LanguageModelClient>) -> Self {
        Self {
            client,
            cache: Arc::new(NoCache),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn EmbeddingCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn client_name(&self) -> &str {
        self.client.name()
    }

    /// Normalizes and extracts one document.
    pub async fn parse(
        &self,
        text: &str,
        kind: DocumentKind,
        config: &ScoringConfig,
    ) -> Result<ParseOutput, EngineError> {
        config.validate()?;
        let document = normalize(text, kind)?;
        match kind {
            DocumentKind::Resume => {
                let profile = extract_profile(&document, self.client.as_ref(), config).await?;
                Ok(ParseOutput::Resume { document, profile })
            }
            DocumentKind::JobDescription => {
                let requirements =
                    extract_requirements(&document, self.client.as_ref(), config).await?;
                Ok(ParseOutput::JobDescription {
                    document,
                    requirements,
                })
            }
        }
    }

    /// Full pipeline: normalize both texts, extract both sides concurrently,
    /// match, aggregate, then build feedback and the quality review. With
    /// `suggest_edits` on, a last model call proposes line rewrites.
    ///
    /// Any failure aborts the whole call; no partial report is returned.
    #[instrument(skip_all, fields(client = self.client.name()))]
    pub async fn score(
        &self,
        resume_text: &str,
        job_description_text: &str,
        config: &ScoringConfig,
    ) -> Result<ScoreReport, EngineError> {
        config.validate()?;
        let resume = normalize(resume_text, DocumentKind::Resume)?;
        let job = normalize(job_description_text, DocumentKind::JobDescription)?;

        let client = self.client.as_ref();
        let (profile, requirements) = tokio::try_join!(
            extract_profile(&resume, client, config),
            extract_requirements(&job, client, config),
        )?;

        let embeddings = Embeddings::new(client, self.cache.as_ref(), config.provider_timeout_ms);
        let results = match_requirements(&profile, &requirements, embeddings, config).await?;

        let breakdown = aggregate(&results, config);
        let quality = review_resume(&resume, &profile);

        let mut feedback = generate_feedback(&results, &breakdown, config);
        feedback.extend(quality.feedback.iter().cloned());

        let suggested_edits = if config.suggest_edits {
            suggest_edits(client, &profile, &results, config).await?
        } else {
            Vec::new()
        };

        info!(
            overall_score = breakdown.overall_score,
            requirements = breakdown.total_requirements,
            matched = breakdown.matched_count,
            quality = quality.score,
            edits = suggested_edits.len(),
            "resume scored"
        );

        Ok(ScoreReport::new(
            breakdown,
            results,
            feedback,
            suggested_edits,
            quality,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LocalClient;
    use crate::models::Severity;

    fn engine() -> AtsEngine {
        AtsEngine::new(Arc::new(LocalClient::default()))
    }

    #[tokio::test]
    async fn test_parse_resume_and_job_description() {
        let engine = engine();
        let config = ScoringConfig::rules_only();

        let resume = engine
            .parse("Skills\nRust, Python", DocumentKind::Resume, &config)
            .await
            .unwrap();
        assert!(matches!(resume, ParseOutput::Resume { ref profile, .. } if profile.skills.len() == 2));

        let job = engine
            .parse("Python required", DocumentKind::JobDescription, &config)
            .await
            .unwrap();
        assert!(matches!(job, ParseOutput::JobDescription { ref requirements, .. } if requirements.len() == 1));
    }

    #[tokio::test]
    async fn test_empty_resume_is_rejected() {
        let err = engine()
            .score("   ", "Python required", &ScoringConfig::rules_only())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::EmptyInput(_)));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_before_work() {
        let config = ScoringConfig {
            must_have_threshold: 2.0,
            ..ScoringConfig::rules_only()
        };
        let err = engine()
            .score("Skills\nRust", "Rust required", &config)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_CONFIG");
    }

    #[tokio::test]
    async fn test_suggestions_off_by_default_in_rules_only() {
        let report = engine()
            .score(
                "Experience\nEngineer at Acme\n• responsible for builds",
                "Docker required",
                &ScoringConfig::rules_only(),
            )
            .await
            .unwrap();
        assert!(report.suggested_edits().is_empty());
    }

    #[tokio::test]
    async fn test_score_orders_requirement_feedback_before_quality() {
        let report = engine()
            .score(
                "Skills\nPython, SQL",
                "Python required\nTerraform required",
                &ScoringConfig::rules_only(),
            )
            .await
            .unwrap();
        assert_eq!(report.match_results().len(), 2);
        assert_eq!(report.feedback()[0].severity, Severity::Critical);
        assert_eq!(report.feedback()[0].related_requirement, Some(1));
        assert_eq!(report.missing_keywords(), vec!["terraform"]);
        assert!(report.overall_score() >= 0.0 && report.overall_score() <= 100.0);
    }
}

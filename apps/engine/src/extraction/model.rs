//! Model-assisted pass over the spans the rules could not resolve.
//!
//! One batched call per document. Answers are merged under the rule results:
//! the model only fills gaps, and a skill it reports is kept only when the
//! document actually mentions it.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::debug;

use super::prompts::{residual_schema, RESIDUAL_INSTRUCTIONS, RESIDUAL_SCHEMA_NAME};
use super::rules::{ResidualKind, ResidualSpan};
use super::taxonomy;
use crate::errors::EngineError;
use crate::llm_client::prompts::GROUNDING_INSTRUCTION;
use crate::llm_client::structured::request_validated;
use crate::llm_client::{LanguageModelClient, PromptSchema};
use crate::models::{Document, Education, Experience, ExtractedProfile, FieldSource, Skill};
use crate::normalizer::{comparison_form, singularize};

const MAX_SPAN_CHARS: usize = 300;
const MAX_SKILL_YEARS: f32 = 60.0;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResidualExtraction {
    #[serde(default)]
    pub experiences: Vec<ModelExperience>,
    #[serde(default)]
    pub skills: Vec<ModelSkill>,
    #[serde(default)]
    pub education: Vec<ModelEducation>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelExperience {
    pub span: usize,
    pub title: Option<String>,
    pub organization: Option<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSkill {
    pub name: String,
    #[serde(default)]
    pub years_experience: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelEducation {
    pub degree: String,
    #[serde(default)]
    pub field: Option<String>,
}

/// One span per line: `[3] (skills_line) underwater basket weaving`.
pub fn render_spans(spans: &[ResidualSpan]) -> String {
    spans
        .iter()
        .enumerate()
        .map(|(i, span)| {
            let text: String = span.text.chars().take(MAX_SPAN_CHARS).collect();
            format!("[{i}] ({}) {text}", span.kind.as_str())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Structural checks beyond what serde enforces.
pub fn validate(extraction: &ResidualExtraction, span_count: usize) -> Result<(), String> {
    if let Some(exp) = extraction.experiences.iter().find(|e| e.span >= span_count) {
        return Err(format!(
            "experience refers to span {} but only {span_count} were sent",
            exp.span
        ));
    }
    if extraction.skills.iter().any(|s| s.name.trim().is_empty()) {
        return Err("skill with empty name".to_string());
    }
    if let Some(skill) = extraction.skills.iter().find(|s| {
        s.years_experience
            .is_some_and(|y| !(0.0..=MAX_SKILL_YEARS).contains(&y))
    }) {
        return Err(format!("implausible years for skill {}", skill.name));
    }
    if extraction.education.iter().any(|e| e.degree.trim().is_empty()) {
        return Err("education entry with empty degree".to_string());
    }
    Ok(())
}

pub async fn extract_residual(
    client: &dyn LanguageModelClient,
    spans: &[ResidualSpan],
    timeout_ms: u64,
) -> Result<ResidualExtraction, EngineError> {
    let schema = PromptSchema::new(
        RESIDUAL_SCHEMA_NAME,
        format!("{RESIDUAL_INSTRUCTIONS}\n\n{GROUNDING_INSTRUCTION}"),
        residual_schema(),
    );
    let input = render_spans(spans);
    let span_count = spans.len();
    request_validated(client, &schema, &input, timeout_ms, |e: &ResidualExtraction| {
        validate(e, span_count)
    })
    .await
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

/// Folds the model's answer into `profile`. Rule-derived fields are never
/// overwritten.
pub fn merge(
    profile: &mut ExtractedProfile,
    spans: &[ResidualSpan],
    extraction: ResidualExtraction,
    document: &Document,
) {
    for exp in extraction.experiences {
        let Some(span) = spans.get(exp.span) else {
            continue;
        };
        let title = clean(exp.title);
        let organization = clean(exp.organization);
        if let Some(title) = &title {
            profile.keywords.insert(taxonomy::comparison_key(title));
        }

        match span.experience {
            Some(idx) => {
                if let Some(target) = profile.experiences.get_mut(idx) {
                    if target.title.is_none() {
                        target.title = title;
                    }
                    if target.organization.is_none() {
                        target.organization = organization;
                    }
                }
            }
            None if title.is_some() || organization.is_some() => {
                let mut responsibilities: Vec<String> = exp
                    .responsibilities
                    .into_iter()
                    .map(|r| r.trim().to_lowercase())
                    .filter(|r| !r.is_empty())
                    .collect();
                if responsibilities.is_empty() && span.kind == ResidualKind::OrphanBullet {
                    responsibilities.push(span.text.clone());
                }
                profile.experiences.push(Experience {
                    title,
                    organization,
                    duration: None,
                    responsibilities,
                    source: FieldSource::Model,
                });
            }
            None => {}
        }
    }

    let vocabulary: HashSet<String> = document.tokens().iter().map(|t| singularize(t)).collect();
    let mentioned: HashSet<String> = taxonomy::scan(document.tokens(), true)
        .into_iter()
        .map(|hit| hit.canonical)
        .collect();

    for skill in extraction.skills {
        let name = skill.name.trim();
        let (canonical, display) = match taxonomy::canonical_skill(name) {
            Some((canonical, display)) => (canonical, display.to_string()),
            None => (comparison_form(name), name.to_string()),
        };
        let grounded = mentioned.contains(&canonical)
            || comparison_form(name)
                .split(' ')
                .all(|token| vocabulary.contains(token));
        if canonical.is_empty() || !grounded {
            debug!(skill = name, "dropping model skill not found in document");
            continue;
        }

        match profile
            .skills
            .iter_mut()
            .find(|s| s.normalized_name == canonical)
        {
            Some(existing) => {
                if existing.years_experience.is_none() {
                    existing.years_experience = skill.years_experience;
                }
            }
            None => {
                profile.keywords.insert(canonical.clone());
                profile.skills.push(Skill {
                    name: display,
                    normalized_name: canonical,
                    years_experience: skill.years_experience,
                    source: FieldSource::Model,
                });
            }
        }
    }

    if profile.education.is_empty() {
        profile.education = extraction
            .education
            .into_iter()
            .map(|e| Education {
                degree: e.degree.trim().to_string(),
                field: clean(e.field),
                source: FieldSource::Model,
            })
            .collect();
    }
}

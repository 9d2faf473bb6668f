//! Optional model pass that turns weak resume lines into concrete
//! "original → upgraded" edits. Runs after the templated feedback and never
//! touches the score.

pub mod prompts;

use std::collections::HashSet;

use serde::Deserialize;
use tracing::{debug, info};

use self::prompts::{edits_schema, EDITS_INSTRUCTIONS, EDITS_SCHEMA_NAME};
use crate::config::ScoringConfig;
use crate::errors::EngineError;
use crate::llm_client::structured::request_validated;
use crate::llm_client::{LanguageModelClient, PromptSchema};
use crate::models::{ExtractedProfile, MatchResult, SuggestedEdit};
use crate::normalizer::comparison_form;
use crate::quality::{is_quantified, starts_with_action_verb};

pub const MAX_SUGGESTIONS: usize = 5;
const MAX_CANDIDATE_LINES: usize = 25;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
struct EditProposals {
    #[serde(default)]
    edits: Vec<EditProposal>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
struct EditProposal {
    line: usize,
    upgraded: String,
    reason: String,
    #[serde(default)]
    requirement: Option<usize>,
}

/// Experience and project lines, weakest first: lines lacking both an action
/// verb and a number, then lines lacking one, then the rest.
fn candidate_lines(profile: &ExtractedProfile) -> Vec<&str> {
    let mut lines: Vec<&str> = profile
        .experiences
        .iter()
        .flat_map(|e| e.responsibilities.iter())
        .chain(profile.projects.iter().flat_map(|p| p.description.iter()))
        .map(String::as_str)
        .filter(|l| !l.trim().is_empty())
        .collect();

    let mut seen = HashSet::new();
    lines.retain(|l| seen.insert(comparison_form(l)));
    lines.sort_by_key(|l| usize::from(starts_with_action_verb(l)) + usize::from(is_quantified(l)));
    lines.truncate(MAX_CANDIDATE_LINES);
    lines
}

/// Indices of requirements that the templated feedback also reports on.
fn gaps<'a>(results: &'a [MatchResult], config: &ScoringConfig) -> Vec<(usize, &'a MatchResult)> {
    results
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.matched || r.similarity_score < config.low_similarity_threshold)
        .collect()
}

fn render(lines: &[&str], gaps: &[(usize, &MatchResult)]) -> String {
    let mut out = String::from("GAPS:\n");
    if gaps.is_empty() {
        out.push_str("(none)\n");
    }
    for (i, r) in gaps {
        let status = if r.matched { "weak" } else { "missing" };
        out.push_str(&format!(
            "[{i}] ({}, {status}) {}\n",
            r.requirement.category.as_str(),
            r.requirement.normalized_keyword
        ));
    }
    out.push_str("\nLINES:\n");
    for (i, line) in lines.iter().enumerate() {
        out.push_str(&format!("[{i}] {line}\n"));
    }
    out
}

fn validate(
    proposals: &EditProposals,
    lines: &[&str],
    gaps: &[(usize, &MatchResult)],
) -> Result<(), String> {
    let mut used = HashSet::new();
    for edit in &proposals.edits {
        let Some(original) = lines.get(edit.line) else {
            return Err(format!("line {} out of range for {} lines", edit.line, lines.len()));
        };
        if !used.insert(edit.line) {
            return Err(format!("line {} edited twice", edit.line));
        }
        if edit.upgraded.trim().is_empty() {
            return Err(format!("empty rewrite for line {}", edit.line));
        }
        if comparison_form(&edit.upgraded) == comparison_form(original) {
            return Err(format!("rewrite for line {} repeats the original", edit.line));
        }
        if let Some(req) = edit.requirement {
            if !gaps.iter().any(|(i, _)| *i == req) {
                return Err(format!("requirement {req} is not one of the listed gaps"));
            }
        }
    }
    Ok(())
}

/// Asks the model for up to `MAX_SUGGESTIONS` rewrites of the weakest
/// experience and project lines. Returns nothing when the profile has no
/// such lines.
///
/// The model answers with line indices, so every `original` is a line from
/// the resume.
pub async fn suggest_edits(
    client: &dyn LanguageModelClient,
    profile: &ExtractedProfile,
    results: &[MatchResult],
    config: &ScoringConfig,
) -> Result<Vec<SuggestedEdit>, EngineError> {
    let lines = candidate_lines(profile);
    if lines.is_empty() {
        debug!("no resume lines to rewrite");
        return Ok(Vec::new());
    }
    let gaps = gaps(results, config);

    let schema = PromptSchema::new(EDITS_SCHEMA_NAME, EDITS_INSTRUCTIONS, edits_schema());
    let proposals: EditProposals = request_validated(
        client,
        &schema,
        &render(&lines, &gaps),
        config.provider_timeout_ms,
        |p: &EditProposals| validate(p, &lines, &gaps),
    )
    .await?;

    let edits: Vec<SuggestedEdit> = proposals
        .edits
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|edit| SuggestedEdit {
            original: lines[edit.line].to_string(),
            upgraded: edit.upgraded.trim().to_string(),
            reason: edit.reason.trim().to_string(),
            related_requirement: edit.requirement,
        })
        .collect();

    info!(
        candidates = lines.len(),
        gaps = gaps.len(),
        edits = edits.len(),
        "suggested edits generated"
    );
    Ok(edits)
}

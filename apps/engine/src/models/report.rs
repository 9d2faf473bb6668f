use serde::{Deserialize, Serialize};

use crate::models::requirement::Requirement;

/// The profile field that satisfied (or came closest to) a requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evidence {
    Skill { name: String },
    Keyword { keyword: String },
    Title { experience: usize, title: String },
    Responsibility { experience: usize, text: String },
    Project { project: usize, text: String },
}

impl Evidence {
    /// Lower is preferred when two fields tie on similarity: explicit skills
    /// cite better than inferred experience text.
    pub fn citation_rank(&self) -> u8 {
        match self {
            Evidence::Skill { .. } => 0,
            Evidence::Keyword { .. } => 1,
            Evidence::Title { .. } => 2,
            Evidence::Responsibility { .. } => 3,
            Evidence::Project { .. } => 4,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Evidence::Skill { name } => format!("skill '{name}'"),
            Evidence::Keyword { keyword } => format!("keyword '{keyword}'"),
            Evidence::Title { title, .. } => format!("title '{title}'"),
            Evidence::Responsibility { text, .. } => format!("bullet '{text}'"),
            Evidence::Project { text, .. } => format!("project '{text}'"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Lexical,
    Semantic,
    /// The profile had nothing to compare against.
    None,
}

/// Outcome for one requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub requirement_index: usize,
    pub requirement: Requirement,
    pub matched_evidence: Vec<Evidence>,
    pub similarity_score: f32,
    pub matched: bool,
    pub method: MatchMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Suggestion,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub severity: Severity,
    pub message: String,
    /// Index into the report's match results.
    pub related_requirement: Option<usize>,
}

impl FeedbackItem {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            related_requirement: None,
        }
    }

    pub fn for_requirement(severity: Severity, message: impl Into<String>, index: usize) -> Self {
        Self {
            severity,
            message: message.into(),
            related_requirement: Some(index),
        }
    }
}

/// How the overall score was reached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// 100 * Σ wᵢsᵢ / Σ wᵢ before the penalty.
    pub weighted_score: f64,
    pub penalty: f64,
    pub overall_score: f64,
    pub unmatched_must_haves: usize,
    pub matched_count: usize,
    pub total_requirements: usize,
}

/// A single resume-writing check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityCheck {
    pub name: String,
    pub score: f64,
    pub max: f64,
    pub detail: String,
}

/// Job-independent resume quality review. Does not feed `overall_score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub score: u32,
    pub checks: Vec<QualityCheck>,
    pub feedback: Vec<FeedbackItem>,
}

/// A concrete rewrite of one resume line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedEdit {
    /// The line as it appears in the normalized resume.
    pub original: String,
    pub upgraded: String,
    pub reason: String,
    /// Index into the report's match results when the edit targets a gap.
    pub related_requirement: Option<usize>,
}

/// Final result of `score`. Fields are read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    overall_score: f64,
    breakdown: ScoreBreakdown,
    match_results: Vec<MatchResult>,
    feedback: Vec<FeedbackItem>,
    suggested_edits: Vec<SuggestedEdit>,
    quality: QualityReport,
}

impl ScoreReport {
    pub(crate) fn new(
        breakdown: ScoreBreakdown,
        match_results: Vec<MatchResult>,
        feedback: Vec<FeedbackItem>,
        suggested_edits: Vec<SuggestedEdit>,
        quality: QualityReport,
    ) -> Self {
        Self {
            overall_score: breakdown.overall_score,
            breakdown,
            match_results,
            feedback,
            suggested_edits,
            quality,
        }
    }

    pub fn overall_score(&self) -> f64 {
        self.overall_score
    }

    pub fn breakdown(&self) -> &ScoreBreakdown {
        &self.breakdown
    }

    pub fn match_results(&self) -> &[MatchResult] {
        &self.match_results
    }

    pub fn feedback(&self) -> &[FeedbackItem] {
        &self.feedback
    }

    /// Empty unless `suggest_edits` was on.
    pub fn suggested_edits(&self) -> &[SuggestedEdit] {
        &self.suggested_edits
    }

    pub fn quality(&self) -> &QualityReport {
        &self.quality
    }

    /// Keywords of requirements that ended up unmatched, in requirement order.
    pub fn missing_keywords(&self) -> Vec<&str> {
        self.match_results
            .iter()
            .filter(|m| !m.matched)
            .map(|m| m.requirement.normalized_keyword.as_str())
            .collect()
    }
}

//! Feedback generation for match results. Template-driven; never calls a model.

use crate::config::ScoringConfig;
use crate::models::{Category, FeedbackItem, MatchResult, ScoreBreakdown, Severity};

/// Overall score at or above which the match is called strong.
pub const STRONG_MATCH_SCORE: f64 = 85.0;
/// Overall score at or above which the match is called moderate.
pub const MODERATE_MATCH_SCORE: f64 = 65.0;

fn requirement_item(r: &MatchResult, index: usize) -> FeedbackItem {
    let keyword = &r.requirement.normalized_keyword;
    let (severity, kind) = match r.requirement.category {
        Category::MustHave => (Severity::Critical, "required"),
        Category::NiceToHave => (Severity::Suggestion, "preferred"),
    };

    let message = match (r.matched, r.matched_evidence.first()) {
        (false, None) => match r.requirement.category {
            Category::MustHave => format!(
                "Missing {kind} qualification '{keyword}': nothing in the resume covers it. \
                 Add it to your skills or experience if you have it."
            ),
            Category::NiceToHave => format!(
                "Consider adding '{keyword}' ({kind}) if you have experience with it."
            ),
        },
        (false, Some(evidence)) => format!(
            "The {kind} qualification '{keyword}' is only partially covered \
             (similarity {:.2}); closest is {}. Name '{keyword}' explicitly.",
            r.similarity_score,
            evidence.describe()
        ),
        (true, Some(evidence)) => format!(
            "The {kind} qualification '{keyword}' is weakly supported \
             (similarity {:.2}) by {}. Add concrete detail about it.",
            r.similarity_score,
            evidence.describe()
        ),
        (true, None) => format!(
            "The {kind} qualification '{keyword}' is weakly supported (similarity {:.2}).",
            r.similarity_score
        ),
    };

    FeedbackItem::for_requirement(severity, message, index)
}

/// Verdict line for the overall score.
pub fn verdict(breakdown: &ScoreBreakdown) -> FeedbackItem {
    let score = breakdown.overall_score;
    let label = if score >= STRONG_MATCH_SCORE {
        "Strong match"
    } else if score >= MODERATE_MATCH_SCORE {
        "Moderate match"
    } else {
        "Weak match"
    };

    let mut message = format!(
        "{label}: {score:.1}/100 with {} of {} requirements matched.",
        breakdown.matched_count, breakdown.total_requirements
    );
    if breakdown.unmatched_must_haves > 0 {
        message.push_str(&format!(
            " {} required qualification(s) missing cost {:.1} points.",
            breakdown.unmatched_must_haves, breakdown.penalty
        ));
    }
    FeedbackItem::new(Severity::Info, message)
}

/// One item per unmatched or weakly matched requirement, in requirement
/// order, followed by the verdict for `breakdown`.
pub fn generate_feedback(
    results: &[MatchResult],
    breakdown: &ScoreBreakdown,
    config: &ScoringConfig,
) -> Vec<FeedbackItem> {
    let mut items: Vec<FeedbackItem> = results
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.matched || r.similarity_score < config.low_similarity_threshold)
        .map(|(i, r)| requirement_item(r, i))
        .collect();

    items.push(verdict(breakdown));
    items
}

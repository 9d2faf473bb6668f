//! Score aggregation. Pure: same results and config, same breakdown.

use tracing::debug;

use crate::config::ScoringConfig;
use crate::models::{MatchResult, ScoreBreakdown};

/// Weighted mean similarity on a 0–100 scale, less a capped penalty for each
/// must-have left unmatched.
pub fn aggregate(results: &[MatchResult], config: &ScoringConfig) -> ScoreBreakdown {
    let mut weight_sum = 0.0f64;
    let mut weighted_sum = 0.0f64;
    let mut unmatched_must_haves = 0;
    let mut matched_count = 0;

    for r in results {
        let weight = f64::from(r.requirement.weight.max(0.0));
        let similarity = f64::from(r.similarity_score.clamp(0.0, 1.0));
        weight_sum += weight;
        weighted_sum += weight * similarity;

        if r.matched {
            matched_count += 1;
        } else if r.requirement.is_must_have() {
            unmatched_must_haves += 1;
        }
    }

    let weighted_score = if weight_sum > 0.0 {
        (100.0 * weighted_sum / weight_sum).clamp(0.0, 100.0)
    } else {
        0.0
    };

    let penalty = (unmatched_must_haves as f64 * config.must_have_penalty_per_miss)
        .min(config.must_have_penalty_cap)
        .max(0.0);

    let overall_score = (weighted_score - penalty).clamp(0.0, 100.0);

    debug!(
        weighted_score,
        penalty,
        overall_score,
        unmatched_must_haves,
        "score aggregated"
    );

    ScoreBreakdown {
        weighted_score,
        penalty,
        overall_score,
        unmatched_must_haves,
        matched_count,
        total_requirements: results.len(),
    }
}

//! Property tests for aggregation, similarity and the rule-based stages.

use proptest::prelude::*;

use ats_engine::extraction::extract_profile_rules_only;
use ats_engine::feedback::generate_feedback;
use ats_engine::matching::cosine_similarity;
use ats_engine::models::{Category, DocumentKind, MatchMethod, MatchResult, Requirement};
use ats_engine::normalizer::normalize;
use ats_engine::requirements::extract_requirements_rules_only;
use ats_engine::scoring::aggregate;
use ats_engine::ScoringConfig;

fn arb_result() -> impl Strategy<Value = MatchResult> {
    (any::<bool>(), 0.05f32..=1.0, 0.0f32..=1.0, any::<bool>()).prop_map(
        |(must, weight, similarity, matched)| MatchResult {
            requirement_index: 0,
            requirement: Requirement::new(
                "req",
                "req",
                if must {
                    Category::MustHave
                } else {
                    Category::NiceToHave
                },
                weight,
            ),
            matched_evidence: vec![],
            similarity_score: similarity,
            matched,
            method: MatchMethod::Semantic,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_score_within_bounds(results in prop::collection::vec(arb_result(), 0..20)) {
        let breakdown = aggregate(&results, &ScoringConfig::default());
        prop_assert!((0.0..=100.0).contains(&breakdown.overall_score));
        prop_assert!((0.0..=100.0).contains(&breakdown.weighted_score));
        prop_assert_eq!(breakdown.total_requirements, results.len());
    }

    #[test]
    fn prop_penalty_bounded_by_cap(
        results in prop::collection::vec(arb_result(), 0..20),
        per_miss in 0.0f64..=20.0,
        cap in 0.0f64..=50.0,
    ) {
        let config = ScoringConfig {
            must_have_penalty_per_miss: per_miss,
            must_have_penalty_cap: cap,
            ..Default::default()
        };
        let breakdown = aggregate(&results, &config);
        prop_assert!(breakdown.penalty <= cap);
        prop_assert!(breakdown.penalty <= breakdown.unmatched_must_haves as f64 * per_miss + 1e-9);
    }

    #[test]
    fn prop_matching_a_missing_must_have_never_lowers_score(
        mut results in prop::collection::vec(arb_result(), 1..20),
        pick in any::<prop::sample::Index>(),
    ) {
        let i = pick.index(results.len());
        results[i].requirement.category = Category::MustHave;
        results[i].matched = false;
        let before = aggregate(&results, &ScoringConfig::default());

        results[i].matched = true;
        results[i].similarity_score = 1.0;
        let after = aggregate(&results, &ScoringConfig::default());

        prop_assert!(after.overall_score + 1e-9 >= before.overall_score);
    }

    #[test]
    fn prop_feedback_ends_with_single_verdict(results in prop::collection::vec(arb_result(), 0..20)) {
        let config = ScoringConfig::default();
        let items = generate_feedback(&results, &aggregate(&results, &config), &config);
        let unmatched = results.iter().filter(|r| !r.matched || r.similarity_score < 0.5).count();
        prop_assert_eq!(items.len(), unmatched + 1);
    }

    #[test]
    fn prop_cosine_within_unit_interval(
        a in prop::collection::vec(-10.0f32..10.0, 8),
        b in prop::collection::vec(-10.0f32..10.0, 8),
    ) {
        let s = cosine_similarity(&a, &b);
        prop_assert!((0.0..=1.0).contains(&s));
    }

    #[test]
    fn prop_rule_stages_accept_any_text(text in "[A-Za-z0-9 ,.:;|•\\-\n]{0,300}") {
        if let Ok(doc) = normalize(&text, DocumentKind::Resume) {
            let profile = extract_profile_rules_only(&doc);
            prop_assert!(profile.skills.iter().all(|s| !s.normalized_name.is_empty()));
        }
        if let Ok(doc) = normalize(&text, DocumentKind::JobDescription) {
            let set = extract_requirements_rules_only(&doc, &ScoringConfig::default());
            prop_assert!(set.iter().all(|r| r.weight > 0.0 && r.weight <= 1.0));
        }
    }
}

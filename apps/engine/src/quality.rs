//! Job-independent resume review: structure, contact details, bullet style
//! and date formatting. Scored out of 100 and reported next to the match
//! score, never folded into it.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::extraction::dates::{find_date_range, DateFormat};
use crate::extraction::rules::{label_sections, ResumeSection};
use crate::feedback::{MODERATE_MATCH_SCORE, STRONG_MATCH_SCORE};
use crate::models::{Document, ExtractedProfile, FeedbackItem, QualityCheck, QualityReport, Severity};

static PASSIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:am|is|are|was|were|been|being)\s+\w+ed\b").unwrap()
});

static FILLER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:responsible for|duties included|assisted with|worked on|involved in)\b")
        .unwrap()
});

const ACTION_VERBS: &[&str] = &[
    "accelerated", "accomplished", "achieved", "adapted", "addressed", "administered", "advised",
    "allocated", "analyzed", "analysed", "architected", "arranged", "assembled", "assessed",
    "audited", "authored", "automated", "balanced", "benchmarked", "boosted", "budgeted", "built",
    "calculated", "chaired", "championed", "clarified", "coached", "collaborated", "communicated",
    "compiled", "completed", "composed", "computed", "conceived", "conducted", "configured",
    "consolidated", "constructed", "contributed", "controlled", "converted", "coordinated",
    "created", "cut", "debugged", "decreased", "defined", "delegated", "delivered", "deployed",
    "designed", "developed", "devised", "diagnosed", "directed", "discovered", "documented",
    "doubled", "drafted", "drove", "earned", "edited", "educated", "eliminated", "enabled",
    "engineered", "enhanced", "ensured", "established", "evaluated", "examined", "executed",
    "expanded", "expedited", "facilitated", "forecasted", "formulated", "founded", "generated",
    "grew", "guided", "halved", "handled", "headed", "identified", "implemented", "improved",
    "increased", "influenced", "initiated", "innovated", "inspected", "installed", "instituted",
    "instructed", "integrated", "interviewed", "introduced", "invented", "investigated",
    "launched", "led", "lowered", "maintained", "managed", "mentored", "migrated", "minimized",
    "maximized", "modeled", "modernized", "monitored", "motivated", "negotiated", "operated",
    "optimized", "orchestrated", "organized", "overhauled", "oversaw", "owned", "performed",
    "pioneered", "planned", "prepared", "presented", "prioritized", "produced", "programmed",
    "promoted", "proposed", "prototyped", "provided", "published", "raised", "rebuilt",
    "recruited", "redesigned", "reduced", "refactored", "reorganized", "replaced", "reported",
    "researched", "resolved", "restructured", "revamped", "reviewed", "revised", "rewrote",
    "saved", "scaled", "scheduled", "secured", "shipped", "simplified", "solved", "spearheaded",
    "standardized", "steered", "streamlined", "strengthened", "structured", "supervised",
    "surpassed", "synthesized", "taught", "tested", "trained", "transformed", "translated",
    "tripled", "troubleshot", "unified", "upgraded", "validated", "verified", "won", "wrote",
];

const COMMON_ADVERBS: &[&str] = &[
    "successfully", "effectively", "consistently", "significantly", "actively", "greatly",
    "strongly", "directly",
];

const MAX_BULLET_CHARS: usize = 170;
const ACTION_VERB_TARGET: f64 = 0.8;
const QUANTIFIED_TARGET: f64 = 0.35;
const CONCISE_TARGET: f64 = 0.85;
const KEYWORD_TARGET: f64 = 30.0;
const SUMMARY_IDEAL_WORDS: (usize, usize) = (25, 75);
const SUMMARY_ACCEPTABLE_WORDS: (usize, usize) = (10, 100);

// Points per check; they add up to 100.
const SECTIONS_MAX: f64 = 15.0;
const CONTACT_MAX: f64 = 10.0;
const SUMMARY_MAX: f64 = 5.0;
const KEYWORDS_MAX: f64 = 15.0;
const DETAILS_MAX: f64 = 10.0;
const ACTION_VERBS_MAX: f64 = 15.0;
const QUANTIFIED_MAX: f64 = 15.0;
const CONCISE_MAX: f64 = 10.0;
const GRAMMAR_MAX: f64 = 5.0;
const DATES_MAX: f64 = 5.0;

/// True when the bullet opens with an action verb, directly or after an
/// adverb ("successfully launched").
pub fn starts_with_action_verb(bullet: &str) -> bool {
    let mut words = bullet
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase());
    let Some(first) = words.next() else {
        return false;
    };
    if ACTION_VERBS.contains(&first.as_str()) {
        return true;
    }
    let adverb = COMMON_ADVERBS.contains(&first.as_str()) || (first.ends_with("ly") && first.len() > 3);
    adverb
        && words
            .next()
            .is_some_and(|second| ACTION_VERBS.contains(&second.as_str()))
}

pub fn is_quantified(bullet: &str) -> bool {
    bullet.chars().any(|c| c.is_ascii_digit())
}

struct Review {
    checks: Vec<QualityCheck>,
    feedback: Vec<FeedbackItem>,
}

impl Review {
    fn check(&mut self, name: &str, score: f64, max: f64, detail: String) {
        self.checks.push(QualityCheck {
            name: name.to_string(),
            score: score.clamp(0.0, max),
            max,
            detail,
        });
    }

    fn suggest(&mut self, message: impl Into<String>) {
        self.feedback.push(FeedbackItem::new(Severity::Suggestion, message));
    }

    fn note(&mut self, message: impl Into<String>) {
        self.feedback.push(FeedbackItem::new(Severity::Info, message));
    }
}

fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// Scores the resume on its own merits and lists what to fix.
pub fn review_resume(document: &Document, profile: &ExtractedProfile) -> QualityReport {
    let sectioned = label_sections(document.lines());
    let mut review = Review {
        checks: Vec::new(),
        feedback: Vec::new(),
    };

    // Sections
    let contact = &profile.contact;
    let has_contact = contact.email.is_some() || contact.phone.is_some() || contact.linkedin.is_some();
    let sections = [
        ("contact details", has_contact),
        (
            "summary",
            profile.summary.is_some() || sectioned.present.contains(&ResumeSection::Summary),
        ),
        (
            "experience",
            !profile.experiences.is_empty() || sectioned.present.contains(&ResumeSection::Experience),
        ),
        (
            "education",
            !profile.education.is_empty() || sectioned.present.contains(&ResumeSection::Education),
        ),
        (
            "skills",
            !profile.skills.is_empty() || sectioned.present.contains(&ResumeSection::Skills),
        ),
    ];
    let missing: Vec<&str> = sections.iter().filter(|(_, ok)| !ok).map(|(n, _)| *n).collect();
    let found = sections.len() - missing.len();
    review.check(
        "section_completeness",
        SECTIONS_MAX * ratio(found, sections.len()),
        SECTIONS_MAX,
        format!("{found} of {} standard sections found", sections.len()),
    );
    if !missing.is_empty() {
        review.suggest(format!(
            "Missing or unclear standard sections: {}. Use clear headers.",
            missing.join(", ")
        ));
    }

    // Contact
    let mut contact_score = 0.0;
    let mut missing_contact = Vec::new();
    if contact.email.is_some() {
        contact_score += CONTACT_MAX * 0.4;
    } else {
        missing_contact.push("email");
    }
    if contact.phone.is_some() {
        contact_score += CONTACT_MAX * 0.4;
    } else {
        missing_contact.push("phone number");
    }
    if contact.linkedin.is_some() {
        contact_score += CONTACT_MAX * 0.2;
    }
    review.check(
        "contact_info",
        contact_score,
        CONTACT_MAX,
        format!(
            "email: {}, phone: {}, linkedin: {}",
            contact.email.is_some(),
            contact.phone.is_some(),
            contact.linkedin.is_some()
        ),
    );
    if !missing_contact.is_empty() {
        review.suggest(format!(
            "Include essential contact details: {}.",
            missing_contact.join(", ")
        ));
    }
    if contact.linkedin.is_none() {
        review.note("Consider adding a LinkedIn profile link.");
    }

    // Summary
    let summary_words = profile
        .summary
        .as_deref()
        .map(|s| s.split_whitespace().count())
        .unwrap_or(0);
    let summary_score = if (SUMMARY_IDEAL_WORDS.0..=SUMMARY_IDEAL_WORDS.1).contains(&summary_words) {
        SUMMARY_MAX
    } else if (SUMMARY_ACCEPTABLE_WORDS.0..=SUMMARY_ACCEPTABLE_WORDS.1).contains(&summary_words) {
        SUMMARY_MAX * 0.5
    } else {
        0.0
    };
    review.check(
        "summary",
        summary_score,
        SUMMARY_MAX,
        format!("{summary_words} words"),
    );
    if summary_words == 0 {
        review.suggest("Add a brief profile summary (2-4 sentences) near the top.");
    } else if summary_words < SUMMARY_IDEAL_WORDS.0 {
        review.suggest("Expand the summary to 2-4 sentences that introduce your key skills.");
    } else if summary_words > SUMMARY_IDEAL_WORDS.1 {
        review.suggest("Condense the summary to 2-4 sentences on your strongest qualifications.");
    }

    // Keywords
    let keywords: BTreeSet<&str> = profile
        .keywords
        .iter()
        .map(String::as_str)
        .chain(profile.skills.iter().map(|s| s.normalized_name.as_str()))
        .collect();
    let keyword_score = KEYWORDS_MAX * (keywords.len() as f64 / KEYWORD_TARGET).min(1.0);
    review.check(
        "keyword_density",
        keyword_score,
        KEYWORDS_MAX,
        format!("{} distinct skills and keywords", keywords.len()),
    );
    if keywords.len() < 10 {
        review.suggest(
            "Keyword count is low. List the tools, technologies and domain terms you work with.",
        );
    } else if keyword_score < KEYWORDS_MAX * 0.7 {
        review.note(format!(
            "{} keywords found. Work more relevant terms into your summary and experience.",
            keywords.len()
        ));
    }

    // Experience and project detail
    let entries = profile.experiences.len() + profile.projects.len();
    let described = profile
        .experiences
        .iter()
        .filter(|e| !e.responsibilities.is_empty())
        .count()
        + profile
            .projects
            .iter()
            .filter(|p| !p.description.is_empty())
            .count();
    let details_score = DETAILS_MAX * ratio(described, entries);
    review.check(
        "experience_details",
        details_score,
        DETAILS_MAX,
        format!("{described} of {entries} entries have bullets"),
    );
    if details_score < DETAILS_MAX {
        review.suggest("Give every work or project entry descriptive bullet points.");
    }

    // Bullets
    let mut bullets: Vec<&str> = sectioned
        .lines
        .iter()
        .filter(|l| {
            l.bullet && matches!(l.section, ResumeSection::Experience | ResumeSection::Projects)
        })
        .map(|l| l.text)
        .collect();
    if bullets.is_empty() {
        bullets = sectioned
            .lines
            .iter()
            .filter(|l| l.bullet && l.section != ResumeSection::Skills)
            .map(|l| l.text)
            .collect();
    }
    let total = bullets.len();
    let action = bullets.iter().filter(|b| starts_with_action_verb(b)).count();
    let quantified = bullets.iter().filter(|b| is_quantified(b)).count();
    let concise = bullets
        .iter()
        .filter(|b| b.chars().count() <= MAX_BULLET_CHARS)
        .count();
    let passive = bullets.iter().filter(|b| PASSIVE_RE.is_match(b)).count();
    let filler = bullets.iter().filter(|b| FILLER_RE.is_match(b)).count();

    let action_score = ACTION_VERBS_MAX * (ratio(action, total) / ACTION_VERB_TARGET).min(1.0);
    review.check(
        "action_verbs",
        action_score,
        ACTION_VERBS_MAX,
        format!("{action} of {total} bullets start with an action verb"),
    );
    if total > 0 && action_score < ACTION_VERBS_MAX * 0.7 {
        review.suggest(format!(
            "Start more bullets ({} more) with strong action verbs such as led, built or reduced.",
            (total - action).max(1)
        ));
    }

    let quantified_score = QUANTIFIED_MAX * (ratio(quantified, total) / QUANTIFIED_TARGET).min(1.0);
    review.check(
        "quantified_results",
        quantified_score,
        QUANTIFIED_MAX,
        format!("{quantified} of {total} bullets contain a number"),
    );
    if total > 0 && quantified_score < QUANTIFIED_MAX * 0.6 {
        let target = ((total as f64 * QUANTIFIED_TARGET) as usize).max(1);
        review.suggest(format!(
            "Quantify achievements with numbers or metrics (aim for about {target} bullets)."
        ));
    }

    let concise_score = CONCISE_MAX * (ratio(concise, total) / CONCISE_TARGET).min(1.0);
    review.check(
        "bullet_conciseness",
        concise_score,
        CONCISE_MAX,
        format!("{concise} of {total} bullets within {MAX_BULLET_CHARS} characters"),
    );
    if total > 0 && concise_score < CONCISE_MAX * 0.8 {
        review.suggest(format!(
            "Keep bullets to one or two lines, under {MAX_BULLET_CHARS} characters."
        ));
    }

    let grammar_score = if total == 0 {
        GRAMMAR_MAX
    } else {
        GRAMMAR_MAX
            - ratio(passive, total) * GRAMMAR_MAX * 1.5
            - ratio(filler, total) * GRAMMAR_MAX * 0.75
    };
    review.check(
        "grammar",
        grammar_score,
        GRAMMAR_MAX,
        format!("{passive} passive, {filler} filler phrases"),
    );
    if grammar_score < GRAMMAR_MAX * 0.8 {
        if passive > 0 {
            review.suggest(format!(
                "Rephrase {passive} passive bullet(s) actively: 'Managed the team', not 'The team was managed'."
            ));
        }
        if filler > 0 {
            review.suggest(format!(
                "Replace weak phrases like 'responsible for' or 'worked on' ({filler} found) with direct action verbs."
            ));
        }
    }

    // Dates
    let formats: BTreeSet<DateFormat> = document
        .lines()
        .iter()
        .filter_map(|l| find_date_range(&l.text))
        .flat_map(|found| [found.start_format, found.end_format])
        .filter(|f| *f != DateFormat::Present)
        .collect();
    let (dates_score, consistent) = match formats.len() {
        0 => (DATES_MAX * 0.5, true),
        1 => (DATES_MAX, true),
        _ => (DATES_MAX * 0.3, false),
    };
    review.check(
        "date_consistency",
        dates_score,
        DATES_MAX,
        format!("{} date format(s) in use", formats.len()),
    );
    if !consistent {
        review.suggest("Use one date format (e.g. 'Jan 2020' or '01/2020') throughout.");
    }

    let total_score: f64 = review.checks.iter().map(|c| c.score).sum();
    let score = total_score.clamp(0.0, 100.0).round() as u32;

    let has_suggestions = review
        .feedback
        .iter()
        .any(|f| f.severity == Severity::Suggestion);
    let overall = if f64::from(score) >= STRONG_MATCH_SCORE {
        if has_suggestions {
            "Resume quality is excellent; the suggestions above are minor polish."
        } else {
            "Resume quality is excellent and follows ATS conventions."
        }
    } else if f64::from(score) >= MODERATE_MATCH_SCORE {
        "Resume quality is good; addressing the suggestions above will make it stronger."
    } else {
        "Resume quality needs significant work for ATS compatibility; start with the suggestions above."
    };
    review.note(format!("Resume quality {score}/100. {overall}"));

    debug!(score, bullets = total, "resume quality reviewed");

    QualityReport {
        score,
        checks: review.checks,
        feedback: review.feedback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::extract_profile_rules_only;
    use crate::models::DocumentKind;
    use crate::normalizer::normalize;

    fn review(text: &str) -> QualityReport {
        let doc = normalize(text, DocumentKind::Resume).unwrap();
        let profile = extract_profile_rules_only(&doc);
        review_resume(&doc, &profile)
    }

    fn check<'a>(report: &'a QualityReport, name: &str) -> &'a QualityCheck {
        report.checks.iter().find(|c| c.name == name).unwrap()
    }

    #[test]
    fn test_action_verb_detection() {
        assert!(starts_with_action_verb("led a team of five"));
        assert!(starts_with_action_verb("Successfully launched the app"));
        assert!(starts_with_action_verb("quickly built tooling"));
        assert!(!starts_with_action_verb("responsible for the build"));
        assert!(!starts_with_action_verb(""));
    }

    #[test]
    fn test_checks_sum_to_at_most_100() {
        let report = review("Jane Doe\njane@example.com\nExperience\nEngineer at Acme\n• Built things");
        let max: f64 = report.checks.iter().map(|c| c.max).sum();
        assert!((max - 100.0).abs() < 1e-9);
        assert!(report.score <= 100);
        assert!(report.checks.iter().all(|c| c.score >= 0.0 && c.score <= c.max));
    }

    #[test]
    fn test_passive_and_filler_are_flagged() {
        let report = review(
            "Experience\nEngineer at Acme\n• Responsible for the deploy pipeline\n• Reports were generated weekly",
        );
        let grammar = check(&report, "grammar");
        assert!(grammar.score < GRAMMAR_MAX);
        assert!(report.feedback.iter().any(|f| f.message.contains("passive")));
        assert!(report.feedback.iter().any(|f| f.message.contains("responsible for")));
    }

    #[test]
    fn test_mixed_date_formats_flagged() {
        let report = review(
            "Experience\nEngineer at Acme | Jan 2019 - Mar 2021\nAnalyst at Initech | 2016-02 - 2018-12",
        );
        let dates = check(&report, "date_consistency");
        assert_eq!(dates.score, DATES_MAX * 0.3);
        assert!(report.feedback.iter().any(|f| f.message.contains("date format")));
    }

    #[test]
    fn test_consistent_dates_score_full() {
        let report = review(
            "Experience\nEngineer at Acme | Jan 2019 - Present\nAnalyst at Initech | Feb 2016 - Dec 2018",
        );
        assert_eq!(check(&report, "date_consistency").score, DATES_MAX);
    }

    #[test]
    fn test_quantified_bullets_counted() {
        let report = review(
            "Experience\nEngineer at Acme\n• Reduced build time by 40%\n• Led migration to Rust",
        );
        let quantified = check(&report, "quantified_results");
        assert_eq!(quantified.score, QUANTIFIED_MAX);
        assert_eq!(check(&report, "action_verbs").score, ACTION_VERBS_MAX);
    }

    #[test]
    fn test_missing_contact_is_suggested() {
        let report = review("Experience\nEngineer at Acme\n• Built things");
        assert!(report
            .feedback
            .iter()
            .any(|f| f.severity == Severity::Suggestion && f.message.contains("email")));
        assert_eq!(check(&report, "contact_info").score, 0.0);
    }

    #[test]
    fn test_overall_note_comes_last() {
        let report = review("Skills\nRust, Python");
        let last = report.feedback.last().unwrap();
        assert_eq!(last.severity, Severity::Info);
        assert!(last.message.starts_with("Resume quality"));
    }

    #[test]
    fn test_undescribed_project_lowers_detail_score() {
        let report = review(
            "Experience\nEngineer at Acme\n• Built things\nProjects\nBudget Bot | Python",
        );
        let details = check(&report, "experience_details");
        assert!((details.score - DETAILS_MAX * 0.5).abs() < 1e-9);
        assert_eq!(details.detail, "1 of 2 entries have bullets");
    }
}

//! Requirement Extractor: job description `Document` → `RequirementSet`.
//!
//! Lines are grouped by section, split into bullet/sentence units and
//! classified by lexical cues. A unit that names several known skills yields
//! one requirement per skill; any other unit yields one requirement keyed on
//! its key phrase.

pub mod prompts;
pub mod refine;

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use crate::config::ScoringConfig;
use crate::errors::EngineError;
use crate::extraction::taxonomy;
use crate::llm_client::LanguageModelClient;
use crate::models::{Category, Document, Line, Requirement, RequirementSet};
use crate::normalizer::{comparison_form, is_stopword, split_sentences, tokenize};

pub const MUST_HAVE_WEIGHT: f32 = 1.0;

static MUST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:required|requires?|must|minimum|need|needs|essential|mandatory|necessary)\b")
        .unwrap()
});

static NICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:preferred|prefer|nice[\s-]to[\s-]have|bonus|plus|ideally|desirable|advantageous|an advantage|good to have)\b",
    )
    .unwrap()
});

static CLAUSE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;]|\b(?:and|but|while|whereas)\b").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JdSection {
    Intro,
    About,
    Benefits,
    Metadata,
    Requirements,
    Preferred,
    Responsibilities,
}

impl JdSection {
    fn is_skipped(self) -> bool {
        matches!(self, JdSection::About | JdSection::Benefits | JdSection::Metadata)
    }

    fn category(self) -> Option<Category> {
        match self {
            JdSection::Requirements => Some(Category::MustHave),
            JdSection::Preferred => Some(Category::NiceToHave),
            _ => None,
        }
    }
}

/// Keys are tokenized and joined with "and" dropped: "What You'll Need" → "what you ll need".
const SECTION_HEADERS: &[(&str, JdSection)] = &[
    ("about", JdSection::About),
    ("about us", JdSection::About),
    ("about the company", JdSection::About),
    ("company overview", JdSection::About),
    ("who we are", JdSection::About),
    ("our company", JdSection::About),
    ("our mission", JdSection::About),
    ("benefits", JdSection::Benefits),
    ("perks", JdSection::Benefits),
    ("perks benefits", JdSection::Benefits),
    ("what we offer", JdSection::Benefits),
    ("why join us", JdSection::Benefits),
    ("compensation", JdSection::Benefits),
    ("compensation benefits", JdSection::Benefits),
    ("salary", JdSection::Metadata),
    ("location", JdSection::Metadata),
    ("job type", JdSection::Metadata),
    ("employment type", JdSection::Metadata),
    ("department", JdSection::Metadata),
    ("reports to", JdSection::Metadata),
    ("start date", JdSection::Metadata),
    ("requirements", JdSection::Requirements),
    ("required", JdSection::Requirements),
    ("qualifications", JdSection::Requirements),
    ("minimum qualifications", JdSection::Requirements),
    ("basic qualifications", JdSection::Requirements),
    ("required qualifications", JdSection::Requirements),
    ("required skills", JdSection::Requirements),
    ("must have", JdSection::Requirements),
    ("must haves", JdSection::Requirements),
    ("what you ll need", JdSection::Requirements),
    ("what you need", JdSection::Requirements),
    ("what you bring", JdSection::Requirements),
    ("who you are", JdSection::Requirements),
    ("skills experience", JdSection::Requirements),
    ("preferred", JdSection::Preferred),
    ("preferred qualifications", JdSection::Preferred),
    ("preferred skills", JdSection::Preferred),
    ("nice to have", JdSection::Preferred),
    ("nice to haves", JdSection::Preferred),
    ("nice-to-have", JdSection::Preferred),
    ("nice-to-haves", JdSection::Preferred),
    ("bonus", JdSection::Preferred),
    ("bonus points", JdSection::Preferred),
    ("good to have", JdSection::Preferred),
    ("additional qualifications", JdSection::Preferred),
    ("responsibilities", JdSection::Responsibilities),
    ("key responsibilities", JdSection::Responsibilities),
    ("what you ll do", JdSection::Responsibilities),
    ("what you will do", JdSection::Responsibilities),
    ("about the role", JdSection::Responsibilities),
    ("the role", JdSection::Responsibilities),
    ("your role", JdSection::Responsibilities),
    ("role overview", JdSection::Responsibilities),
    ("duties", JdSection::Responsibilities),
    ("in this role", JdSection::Responsibilities),
    ("day to day", JdSection::Responsibilities),
];

const MAX_HEADER_TOKENS: usize = 6;
const MAX_TITLE_TOKENS: usize = 10;
const MAX_KEY_PHRASE_TOKENS: usize = 4;

/// Role nouns that mark an opening line as the job title.
const TITLE_WORDS: &[&str] = &[
    "engineer", "engineers", "developer", "developers", "programmer", "architect", "manager",
    "analyst", "scientist", "designer", "consultant", "specialist", "administrator", "director",
    "coordinator", "lead", "intern", "internship", "technician", "researcher", "officer",
    "head", "principal", "staff", "sre", "devops",
];

/// Units containing any of these are hiring boilerplate, not requirements.
const BOILERPLATE: &[&str] = &[
    "equal opportunity",
    "we are an",
    "we're a",
    "how to apply",
    "apply now",
    "to apply",
    "visa sponsorship",
    "reasonable accommodation",
    "salary range",
    "all qualified applicants",
];

/// Cue words that carry no subject matter.
const CUE_NOISE: &[&str] = &[
    "need", "needs", "essential", "mandatory", "necessary", "prefer", "desirable", "advantage",
    "advantageous", "nice-to-have", "good", "have", "has", "hands-on", "demonstrable", "deep",
    "excellent", "ideal", "candidate", "role", "position", "team", "work", "working",
];

/// Leading duty verbs dropped from key phrases: "design payment systems" → "payment systems".
const DUTY_VERBS: &[&str] = &[
    "build", "building", "design", "designing", "develop", "developing", "maintain",
    "maintaining", "implement", "implementing", "create", "creating", "lead", "leading", "manage",
    "managing", "own", "owning", "drive", "driving", "collaborate", "collaborating", "partner",
    "partnering", "write", "writing", "deliver", "delivering", "support", "supporting", "ensure",
    "ensuring", "improve", "improving", "help", "helping", "ship", "shipping", "deploy",
    "deploying", "operate", "operating", "architect", "architecting", "define", "defining",
    "scale", "scaling",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cue {
    None,
    Must,
    Nice,
    Both,
}

impl Cue {
    fn of(text: &str) -> Self {
        match (MUST_RE.is_match(text), NICE_RE.is_match(text)) {
            (true, true) => Cue::Both,
            (true, false) => Cue::Must,
            (false, true) => Cue::Nice,
            (false, false) => Cue::None,
        }
    }

    fn category(self) -> Option<Category> {
        match self {
            Cue::Must => Some(Category::MustHave),
            Cue::Nice => Some(Category::NiceToHave),
            Cue::None | Cue::Both => None,
        }
    }
}

fn header_of(line: &Line) -> Option<(JdSection, &str)> {
    if line.bullet {
        return None;
    }
    let (head, rest) = match line.text.split_once(':') {
        Some((head, rest)) => (head, rest.trim()),
        None => (line.text.as_str(), ""),
    };
    let tokens: Vec<String> = tokenize(head)
        .into_iter()
        .filter(|t| t != "and")
        .collect();
    if tokens.is_empty() || tokens.len() > MAX_HEADER_TOKENS {
        return None;
    }
    let key = tokens.join(" ");
    SECTION_HEADERS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, section)| (*section, rest))
}

fn is_boilerplate(unit: &str) -> bool {
    BOILERPLATE.iter().any(|phrase| unit.contains(phrase))
}

/// Short phrase naming what a non-skill unit asks for, in comparison form.
fn key_phrase(clause: &str) -> Option<String> {
    let mut words: Vec<String> = tokenize(clause)
        .into_iter()
        .filter(|t| t.chars().any(|c| c.is_alphabetic()))
        .filter(|t| !is_stopword(t) && !CUE_NOISE.contains(&t.as_str()))
        .collect();
    let leading_verbs = words
        .iter()
        .take_while(|w| DUTY_VERBS.contains(&w.as_str()))
        .count();
    words.drain(..leading_verbs);
    words.truncate(MAX_KEY_PHRASE_TOKENS);
    if words.is_empty() {
        return None;
    }
    Some(comparison_form(&words.join(" ")))
}

struct UnitContext<'a> {
    text: &'a str,
    section: JdSection,
    list_context: bool,
    nice_to_have_weight: f32,
}

impl UnitContext<'_> {
    fn emit(&self, clause: &str, category: Option<Category>, out: &mut Vec<Requirement>) {
        let category = category.unwrap_or(Category::NiceToHave);
        let weight = match category {
            Category::MustHave => MUST_HAVE_WEIGHT,
            Category::NiceToHave => self.nice_to_have_weight,
        };

        let mut keys: Vec<String> = Vec::new();
        for hit in taxonomy::scan(&tokenize(clause), self.list_context) {
            if !keys.contains(&hit.canonical) {
                keys.push(hit.canonical);
            }
        }
        if keys.is_empty() {
            keys.extend(key_phrase(clause));
        }
        for key in keys {
            out.push(Requirement::new(self.text, key, category, weight));
        }
    }

    fn requirements(&self, out: &mut Vec<Requirement>) {
        let section_category = self.section.category();
        match Cue::of(self.text) {
            Cue::Both => {
                for clause in CLAUSE_SPLIT_RE.split(self.text) {
                    let category = Cue::of(clause).category().or(section_category);
                    self.emit(clause, category, out);
                }
            }
            cue => self.emit(self.text, cue.category().or(section_category), out),
        }
    }
}

/// A short, cue-free opening line that either names a role or sits directly
/// above a section header.
fn looks_like_title(line: &Line, text: &str, next: Option<&Line>) -> bool {
    let Some(next) = next else {
        return false;
    };
    let tokens = tokenize(text);
    if line.bullet || tokens.len() > MAX_TITLE_TOKENS || Cue::of(text) != Cue::None {
        return false;
    }
    tokens.iter().any(|t| TITLE_WORDS.contains(&t.as_str())) || header_of(next).is_some()
}

/// Every requirement in document order, before deduplication.
fn candidate_requirements(document: &Document, config: &ScoringConfig) -> Vec<Requirement> {
    let lines = document.lines();
    let mut section = JdSection::Intro;
    let mut out = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let (effective, text) = match header_of(line) {
            Some((s, "")) => {
                section = s;
                continue;
            }
            Some((s, rest)) => (s, rest),
            None => (section, line.text.as_str()),
        };
        if effective.is_skipped() {
            continue;
        }

        if i == 0 && looks_like_title(line, text, lines.get(1)) {
            continue;
        }

        let units = if line.bullet {
            vec![text.to_string()]
        } else {
            split_sentences(text)
        };
        for unit in units.iter().filter(|u| !is_boilerplate(u)) {
            let context = UnitContext {
                text: unit,
                section: effective,
                list_context: unit.contains([',', '/'])
                    || matches!(effective, JdSection::Requirements | JdSection::Preferred),
                nice_to_have_weight: config.nice_to_have_weight,
            };
            context.requirements(&mut out);
        }
    }
    out
}

/// Keeps one requirement per keyword at its first-seen position, taking the
/// content of the highest-weighted occurrence.
fn dedupe(candidates: Vec<Requirement>) -> Vec<Requirement> {
    let mut out: Vec<Requirement> = Vec::with_capacity(candidates.len());
    let mut seen: HashMap<String, usize> = HashMap::new();
    for requirement in candidates {
        match seen.get(&requirement.normalized_keyword) {
            Some(&idx) => {
                if requirement.weight > out[idx].weight {
                    out[idx] = requirement;
                }
            }
            None => {
                seen.insert(requirement.normalized_keyword.clone(), out.len());
                out.push(requirement);
            }
        }
    }
    out
}

pub fn extract_requirements_rules_only(document: &Document, config: &ScoringConfig) -> RequirementSet {
    RequirementSet::new(dedupe(candidate_requirements(document, config)))
}

/// Rule-based extraction, optionally followed by model weight refinement.
pub async fn extract_requirements(
    document: &Document,
    client: &dyn LanguageModelClient,
    config: &ScoringConfig,
) -> Result<RequirementSet, EngineError> {
    let mut candidates = candidate_requirements(document, config);
    if config.refine_weights && !candidates.is_empty() {
        refine::refine_weights(client, &mut candidates, config.provider_timeout_ms).await?;
    }
    let set = RequirementSet::new(dedupe(candidates));
    info!(
        requirements = set.len(),
        must_have = set.must_haves().count(),
        refined = config.refine_weights,
        "requirements extracted"
    );
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentKind;
    use crate::normalizer::normalize;

    fn extract(text: &str) -> Vec<Requirement> {
        let doc = normalize(text, DocumentKind::JobDescription).unwrap();
        extract_requirements_rules_only(&doc, &ScoringConfig::default()).requirements
    }

    fn summary(reqs: &[Requirement]) -> Vec<(&str, Category)> {
        reqs.iter()
            .map(|r| (r.normalized_keyword.as_str(), r.category))
            .collect()
    }

    #[test]
    fn test_lexical_cues_and_weights() {
        let reqs = extract("Python required\nDocker is a plus");
        assert_eq!(
            summary(&reqs),
            vec![("python", Category::MustHave), ("docker", Category::NiceToHave)]
        );
        assert_eq!(reqs[0].weight, 1.0);
        assert_eq!(reqs[1].weight, 0.4);
    }

    #[test]
    fn test_sections_title_and_skipped_blocks() {
        let jd = "Senior Backend Engineer
About Us
We are a fintech startup building payment rails with Rust.
Requirements:
- 5+ years of experience with Python
- Strong SQL and PostgreSQL skills
Nice to have
- Kubernetes
- Experience with Go
Benefits
- Unlimited PTO and a Java conference budget";
        let reqs = extract(jd);
        assert_eq!(
            summary(&reqs),
            vec![
                ("python", Category::MustHave),
                ("sql", Category::MustHave),
                ("postgresql", Category::MustHave),
                ("kubernetes", Category::NiceToHave),
                ("go", Category::NiceToHave),
            ]
        );
        assert_eq!(reqs[0].text, "5+ years of experience with python");
    }

    #[test]
    fn test_opening_skill_line_is_not_a_title() {
        let reqs = extract("Kubernetes\nPython required");
        assert_eq!(
            summary(&reqs),
            vec![("kubernetes", Category::NiceToHave), ("python", Category::MustHave)]
        );
    }

    #[test]
    fn test_opening_line_above_header_is_a_title() {
        let reqs = extract("Acme Payments\nRequirements\n- Rust");
        assert_eq!(summary(&reqs), vec![("rust", Category::MustHave)]);
    }

    #[test]
    fn test_unit_cue_overrides_section() {
        let reqs = extract("Requirements\n- Docker experience is a plus\n- Kafka");
        assert_eq!(
            summary(&reqs),
            vec![("docker", Category::NiceToHave), ("kafka", Category::MustHave)]
        );
    }

    #[test]
    fn test_mixed_cues_split_into_clauses() {
        let reqs = extract("Python is required, Go is a plus.");
        assert_eq!(
            summary(&reqs),
            vec![("python", Category::MustHave), ("go", Category::NiceToHave)]
        );
    }

    #[test]
    fn test_no_cue_defaults_to_nice_to_have() {
        let reqs = extract("Responsibilities\n- Work with Terraform daily");
        assert_eq!(summary(&reqs), vec![("terraform", Category::NiceToHave)]);
    }

    #[test]
    fn test_key_phrase_for_non_skill_unit() {
        let reqs = extract("- Must have experience designing payment systems");
        assert_eq!(summary(&reqs), vec![("payment system", Category::MustHave)]);
    }

    #[test]
    fn test_dedupe_keeps_higher_weight_at_first_position() {
        let reqs = extract("Python is a plus\nRust required\nPython required");
        assert_eq!(
            summary(&reqs),
            vec![("python", Category::MustHave), ("rust", Category::MustHave)]
        );
        assert_eq!(reqs[0].weight, 1.0);
        assert_eq!(reqs[0].text, "python required");
    }

    #[test]
    fn test_boilerplate_and_metadata_skipped() {
        let reqs = extract(
            "Location: Remote\nRust required\nWe are an equal opportunity employer.",
        );
        assert_eq!(summary(&reqs), vec![("rust", Category::MustHave)]);
    }

    #[test]
    fn test_custom_nice_to_have_weight() {
        let doc = normalize("Docker is a plus\nRust required", DocumentKind::JobDescription).unwrap();
        let config = ScoringConfig {
            nice_to_have_weight: 0.25,
            ..Default::default()
        };
        let set = extract_requirements_rules_only(&doc, &config);
        assert_eq!(set.requirements[0].weight, 0.25);
    }
}

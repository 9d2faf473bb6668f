//! Text Normalizer — turns raw resume / job description text into a `Document`.
//!
//! Lower-cases, strips boilerplate (page furniture, running headers, bullet
//! glyphs), collapses whitespace, then splits into lines, sentences and tokens.
//! Pure and deterministic.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::errors::EngineError;
use crate::models::{Document, DocumentKind, Line};

/// Tokens keep technology punctuation inside a word: `c++`, `c#`, `node.js`, `ci-cd`.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{L}\p{N}][\p{L}\p{N}+#._\-]*[\p{L}\p{N}+#]|[\p{L}\p{N}]").unwrap()
});

static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[•●▪◦‣➢➤►▸✓✔∙·○■□]\s*|[*\-+]\s+|\d{1,2}[.)]\s+)").unwrap()
});

static PAGE_FURNITURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:page\s+\d+(?:\s+of\s+\d+)?|\d+\s*(?:/|of)\s*\d+|-?\s*\d{1,3}\s*-?)$").unwrap()
});

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const BOILERPLATE_LINES: &[&str] = &[
    "confidential",
    "curriculum vitae",
    "resume",
    "résumé",
    "references available upon request",
    "references available on request",
    "references upon request",
];

/// A short line seen this many times is treated as a running header/footer.
const RUNNING_HEADER_MIN_REPEATS: usize = 3;
const RUNNING_HEADER_MAX_TOKENS: usize = 8;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "been", "being", "but", "by", "can", "for", "from",
    "has", "have", "he", "her", "his", "i", "if", "in", "into", "is", "it", "its", "me", "my",
    "of", "on", "or", "our", "she", "so", "such", "than", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "those", "to", "us", "was", "we", "were", "which", "while",
    "who", "will", "with", "within", "would", "you", "your", "etc", "e.g", "i.e", "also", "other",
    "able", "ability", "strong", "solid", "good", "excellent", "proven", "demonstrated",
    "experience", "experienced", "knowledge", "understanding", "familiarity", "familiar",
    "proficiency", "proficient", "skill", "skills", "year", "years", "plus", "required",
    "requirement", "requirements", "preferred", "must", "nice", "bonus", "ideally", "minimum",
    "including", "include", "includes", "related", "relevant", "using", "use", "least",
];

/// Lower-cased tokens of `text`.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// English plural stripping, just enough that "APIs" and "API" compare equal.
/// Words carrying digits or symbols are left alone.
pub fn singularize(word: &str) -> String {
    let len = word.chars().count();
    if len <= 3 || !word.chars().all(|c| c.is_alphabetic()) {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ies") {
        if len > 4 {
            return format!("{stem}y");
        }
    }
    for suffix in ["sses", "xes", "ches", "shes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }
    match word.strip_suffix('s') {
        Some(stem) => stem.to_string(),
        None => word.to_string(),
    }
}

/// Case- and plural-insensitive form used for keyword equality:
/// tokens singularized and joined by single spaces.
pub fn comparison_form(term: &str) -> String {
    tokenize(term)
        .iter()
        .map(|t| singularize(t))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tokens of `text` with stopwords removed.
pub fn content_tokens(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| !is_stopword(t))
        .collect()
}

/// Builds a `Document`. Fails with `EmptyInput` when no tokens survive cleaning.
pub fn normalize(text: &str, kind: DocumentKind) -> Result<Document, EngineError> {
    if text.trim().is_empty() {
        return Err(EngineError::EmptyInput(format!(
            "{} text is empty",
            kind.as_str()
        )));
    }

    let mut lines: Vec<Line> = text.lines().filter_map(clean_line).collect();
    drop_running_headers(&mut lines);

    let sentences: Vec<String> = lines.iter().flat_map(|l| split_sentences(&l.text)).collect();
    let tokens: Vec<String> = sentences.iter().flat_map(|s| tokenize(s)).collect();

    if tokens.is_empty() {
        return Err(EngineError::EmptyInput(format!(
            "{} text has no usable tokens after cleaning",
            kind.as_str()
        )));
    }

    debug!(
        kind = kind.as_str(),
        lines = lines.len(),
        sentences = sentences.len(),
        tokens = tokens.len(),
        "document normalized"
    );

    Ok(Document::new(kind, text.to_string(), lines, sentences, tokens))
}

fn clean_line(raw: &str) -> Option<Line> {
    let mapped: String = raw
        .chars()
        .filter(|c| !matches!(c, '\u{200b}' | '\u{feff}' | '\u{00ad}'))
        .map(|c| match c {
            '\u{a0}' | '\t' => ' ',
            '–' | '—' | '‒' | '−' => '-',
            '‘' | '’' => '\'',
            '“' | '”' => '"',
            other => other,
        })
        .collect();

    let bullet = BULLET_RE.is_match(&mapped);
    let stripped = if bullet {
        BULLET_RE.replace(&mapped, "").into_owned()
    } else {
        mapped
    };

    let collapsed = WHITESPACE_RE.replace_all(stripped.trim(), " ").to_lowercase();
    if collapsed.is_empty() || !collapsed.chars().any(|c| c.is_alphanumeric()) {
        return None;
    }
    if PAGE_FURNITURE_RE.is_match(&collapsed) || BOILERPLATE_LINES.contains(&collapsed.as_str()) {
        return None;
    }

    Some(Line {
        text: collapsed,
        bullet,
    })
}

fn drop_running_headers(lines: &mut Vec<Line>) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for line in lines.iter().filter(|l| !l.bullet) {
        *counts.entry(line.text.as_str()).or_default() += 1;
    }
    let repeated: Vec<String> = counts
        .into_iter()
        .filter(|(text, n)| {
            *n >= RUNNING_HEADER_MIN_REPEATS
                && tokenize(text).len() <= RUNNING_HEADER_MAX_TOKENS
        })
        .map(|(text, _)| text.to_string())
        .collect();
    if !repeated.is_empty() {
        lines.retain(|l| l.bullet || !repeated.contains(&l.text));
    }
}

/// Splits on `.`, `!`, `?`, `;` followed by whitespace, so `node.js` survives.
pub(crate) fn split_sentences(line: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        current.push(c);
        let boundary = matches!(c, '.' | '!' | '?' | ';')
            && chars.peek().map_or(true, |next| next.is_whitespace());
        if boundary {
            push_sentence(&mut sentences, &current);
            current.clear();
        }
    }
    push_sentence(&mut sentences, &current);
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim().trim_end_matches(['.', ';', '!', '?']).trim();
    if trimmed.chars().any(|c| c.is_alphanumeric()) {
        sentences.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_keeps_tech_punctuation() {
        assert_eq!(
            tokenize("C++, C# and Node.js."),
            vec!["c++", "c#", "and", "node.js"]
        );
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("apis"), "api");
        assert_eq!(singularize("databases"), "database");
        assert_eq!(singularize("technologies"), "technology");
        assert_eq!(singularize("analysis"), "analysis");
        assert_eq!(singularize("aws"), "aws");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("c++"), "c++");
    }

    #[test]
    fn test_comparison_form_is_case_and_plural_insensitive() {
        assert_eq!(comparison_form("REST APIs"), comparison_form("rest api"));
        assert_eq!(comparison_form("  Data   Pipelines "), "data pipeline");
    }

    #[test]
    fn test_normalize_strips_bullets_and_lowercases() {
        let doc = normalize("• Built APIs in Rust\n- Led a team of 4", DocumentKind::Resume).unwrap();
        assert_eq!(doc.lines().len(), 2);
        assert!(doc.lines().iter().all(|l| l.bullet));
        assert_eq!(doc.lines()[0].text, "built apis in rust");
        assert_eq!(doc.lines()[1].text, "led a team of 4");
    }

    #[test]
    fn test_normalize_drops_page_furniture() {
        let text = "Jane Doe\nPage 1 of 2\nSkills: Rust\n2\nConfidential";
        let doc = normalize(text, DocumentKind::Resume).unwrap();
        let texts: Vec<_> = doc.lines().iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["jane doe", "skills: rust"]);
    }

    #[test]
    fn test_normalize_drops_running_headers() {
        let text = "Acme Corp - Careers\nWe build rockets\nAcme Corp - Careers\nRust required\nAcme Corp - Careers";
        let doc = normalize(text, DocumentKind::JobDescription).unwrap();
        assert!(doc.lines().iter().all(|l| l.text != "acme corp - careers"));
        assert_eq!(doc.lines().len(), 2);
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        let doc = normalize("Senior\t\tEngineer   at\u{a0}Acme", DocumentKind::Resume).unwrap();
        assert_eq!(doc.lines()[0].text, "senior engineer at acme");
    }

    #[test]
    fn test_sentences_split_but_keep_dotted_names() {
        let doc = normalize(
            "We use Node.js daily. Python is required; Go is a plus.",
            DocumentKind::JobDescription,
        )
        .unwrap();
        assert_eq!(
            doc.sentences(),
            &["we use node.js daily", "python is required", "go is a plus"]
        );
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = normalize("   \n\t ", DocumentKind::Resume).unwrap_err();
        assert!(matches!(err, EngineError::EmptyInput(_)));
    }

    #[test]
    fn test_only_boilerplate_rejected() {
        let err = normalize("• \nPage 1 of 3\n---\n", DocumentKind::JobDescription).unwrap_err();
        assert!(matches!(err, EngineError::EmptyInput(_)));
    }

    #[test]
    fn test_raw_text_preserved() {
        let raw = "Rust Engineer\n• Ship things";
        let doc = normalize(raw, DocumentKind::Resume).unwrap();
        assert_eq!(doc.raw_text(), raw);
        assert_eq!(doc.kind(), DocumentKind::Resume);
    }
}

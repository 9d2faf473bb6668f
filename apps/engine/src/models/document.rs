use serde::{Deserialize, Serialize};

/// Which side of the comparison a document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Resume,
    JobDescription,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Resume => "resume",
            DocumentKind::JobDescription => "job_description",
        }
    }
}

/// A cleaned line of the source text. `bullet` is true when the line started
/// with a bullet glyph or list marker before cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub text: String,
    pub bullet: bool,
}

/// Normalized representation of a resume or job description.
///
/// Built only by `normalizer::normalize`; there is no way to mutate one after
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    kind: DocumentKind,
    raw_text: String,
    lines: Vec<Line>,
    sentences: Vec<String>,
    tokens: Vec<String>,
}

impl Document {
    pub(crate) fn new(
        kind: DocumentKind,
        raw_text: String,
        lines: Vec<Line>,
        sentences: Vec<String>,
        tokens: Vec<String>,
    ) -> Self {
        Self {
            kind,
            raw_text,
            lines,
            sentences,
            tokens,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn sentences(&self) -> &[String] {
        &self.sentences
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    MustHave,
    NiceToHave,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::MustHave => "must_have",
            Category::NiceToHave => "nice_to_have",
        }
    }
}

/// A single qualification parsed from a job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    /// The sentence or bullet the requirement came from.
    pub text: String,
    /// Concept the matcher compares against, e.g. "python" or "stakeholder management".
    pub normalized_keyword: String,
    pub category: Category,
    /// In (0, 1]. Not normalized across the set.
    pub weight: f32,
}

impl Requirement {
    pub fn new(
        text: impl Into<String>,
        normalized_keyword: impl Into<String>,
        category: Category,
        weight: f32,
    ) -> Self {
        Self {
            text: text.into(),
            normalized_keyword: normalized_keyword.into(),
            category,
            weight,
        }
    }

    pub fn is_must_have(&self) -> bool {
        self.category == Category::MustHave
    }
}

/// Ordered requirements of one job description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementSet {
    pub requirements: Vec<Requirement>,
}

impl RequirementSet {
    pub fn new(requirements: Vec<Requirement>) -> Self {
        Self { requirements }
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Requirement> {
        self.requirements.iter()
    }

    pub fn must_haves(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements.iter().filter(|r| r.is_must_have())
    }
}

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which extraction strategy produced a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    Rules,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    /// Display form, e.g. "PostgreSQL".
    pub name: String,
    /// Comparison key, e.g. "postgresql".
    pub normalized_name: String,
    pub years_experience: Option<f32>,
    pub source: FieldSource,
}

/// A start/end pair parsed from an experience header. `end = None` means the
/// position is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub title: Option<String>,
    pub organization: Option<String>,
    pub duration: Option<DateRange>,
    pub responsibilities: Vec<String>,
    pub source: FieldSource,
}

/// An entry from a Projects section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    /// Display names of taxonomy skills mentioned anywhere in the entry.
    pub technologies: Vec<String>,
    pub description: Vec<String>,
    pub source: FieldSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub field: Option<String>,
    pub source: FieldSource,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
}

/// Structured view of a resume. Produced by the extraction stage and read by
/// everything downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedProfile {
    pub skills: Vec<Skill>,
    pub experiences: Vec<Experience>,
    #[serde(default)]
    pub projects: Vec<Project>,
    pub education: Vec<Education>,
    pub keywords: BTreeSet<String>,
    pub contact: ContactInfo,
    pub summary: Option<String>,
}

impl ExtractedProfile {
    pub fn skill(&self, normalized_name: &str) -> Option<&Skill> {
        self.skills
            .iter()
            .find(|s| s.normalized_name == normalized_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_lookup_by_normalized_name() {
        let profile = ExtractedProfile {
            skills: vec![Skill {
                name: "PostgreSQL".to_string(),
                normalized_name: "postgresql".to_string(),
                years_experience: Some(3.0),
                source: FieldSource::Rules,
            }],
            ..Default::default()
        };
        assert_eq!(profile.skill("postgresql").map(|s| s.name.as_str()), Some("PostgreSQL"));
        assert!(profile.skill("PostgreSQL").is_none());
    }

    #[test]
    fn test_current_range_serializes_null_end() {
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2023, 7, 1).unwrap(),
            end: None,
        };
        let json = serde_json::to_value(range).unwrap();
        assert_eq!(json["start"], "2023-07-01");
        assert!(json["end"].is_null());
    }
}

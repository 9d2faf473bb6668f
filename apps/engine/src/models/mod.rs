pub mod document;
pub mod profile;
pub mod report;
pub mod requirement;

pub use document::{Document, DocumentKind, Line};
pub use profile::{
    ContactInfo, DateRange, Education, Experience, ExtractedProfile, FieldSource, Project, Skill,
};
pub use report::{
    Evidence, FeedbackItem, MatchMethod, MatchResult, QualityCheck, QualityReport, ScoreBreakdown,
    ScoreReport, Severity, SuggestedEdit,
};
pub use requirement::{Category, Requirement, RequirementSet};

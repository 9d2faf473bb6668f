//! Rule-based resume extraction: sections, skills, years, experience headers,
//! education and contact details. Whatever the rules cannot resolve is
//! returned as residual spans for the model pass.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::dates::find_date_range;
use super::taxonomy;
use crate::models::{
    ContactInfo, DateRange, Document, Education, Experience, ExtractedProfile, FieldSource, Line,
    Project, Skill,
};
use crate::normalizer::tokenize;

// ──────────────────────────────────────────────────────────
// Sections
// ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeSection {
    /// Lines before the first recognised header (name, contact line).
    Preamble,
    Summary,
    Experience,
    Education,
    Skills,
    Projects,
    Certifications,
    Other,
}

/// Header keys are token-joined with "and" removed: "Skills & Tools" → "skills tools".
const SECTION_HEADERS: &[(&str, ResumeSection)] = &[
    ("summary", ResumeSection::Summary),
    ("professional summary", ResumeSection::Summary),
    ("profile", ResumeSection::Summary),
    ("profile summary", ResumeSection::Summary),
    ("professional profile", ResumeSection::Summary),
    ("objective", ResumeSection::Summary),
    ("career objective", ResumeSection::Summary),
    ("about me", ResumeSection::Summary),
    ("experience", ResumeSection::Experience),
    ("work experience", ResumeSection::Experience),
    ("professional experience", ResumeSection::Experience),
    ("relevant experience", ResumeSection::Experience),
    ("employment", ResumeSection::Experience),
    ("employment history", ResumeSection::Experience),
    ("work history", ResumeSection::Experience),
    ("career history", ResumeSection::Experience),
    ("education", ResumeSection::Education),
    ("academic background", ResumeSection::Education),
    ("education training", ResumeSection::Education),
    ("education certifications", ResumeSection::Education),
    ("skills", ResumeSection::Skills),
    ("technical skills", ResumeSection::Skills),
    ("key skills", ResumeSection::Skills),
    ("core skills", ResumeSection::Skills),
    ("core competencies", ResumeSection::Skills),
    ("competencies", ResumeSection::Skills),
    ("technologies", ResumeSection::Skills),
    ("tech stack", ResumeSection::Skills),
    ("skills tools", ResumeSection::Skills),
    ("tools", ResumeSection::Skills),
    ("projects", ResumeSection::Projects),
    ("personal projects", ResumeSection::Projects),
    ("selected projects", ResumeSection::Projects),
    ("key projects", ResumeSection::Projects),
    ("certifications", ResumeSection::Certifications),
    ("certificates", ResumeSection::Certifications),
    ("licenses certifications", ResumeSection::Certifications),
    ("awards", ResumeSection::Other),
    ("achievements", ResumeSection::Other),
    ("publications", ResumeSection::Other),
    ("languages", ResumeSection::Other),
    ("interests", ResumeSection::Other),
    ("hobbies", ResumeSection::Other),
    ("volunteer", ResumeSection::Other),
    ("volunteering", ResumeSection::Other),
    ("references", ResumeSection::Other),
];

const MAX_HEADER_TOKENS: usize = 4;

/// A content line tagged with the section it sits in. Header-only lines are
/// not included; `skills: python, sql` yields one line with text `python, sql`.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledLine<'a> {
    pub section: ResumeSection,
    pub text: &'a str,
    pub bullet: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SectionedResume<'a> {
    pub lines: Vec<LabeledLine<'a>>,
    /// Every section that had a header, inline or standalone.
    pub present: BTreeSet<ResumeSection>,
}

/// Section for a header line, plus any inline content after a colon.
fn header_of(line: &Line) -> Option<(ResumeSection, &str)> {
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

pub fn label_sections(lines: &[Line]) -> SectionedResume<'_> {
    let mut out = SectionedResume::default();
    let mut current = ResumeSection::Preamble;

    for line in lines {
        match header_of(line) {
            Some((section, "")) => {
                current = section;
                out.present.insert(section);
            }
            // inline header content belongs to that section for this line only
            Some((section, rest)) => {
                out.present.insert(section);
                out.lines.push(LabeledLine {
                    section,
                    text: rest,
                    bullet: false,
                });
            }
            None => out.lines.push(LabeledLine {
                section: current,
                text: &line.text,
                bullet: line.bullet,
            }),
        }
    }
    out
}

// ──────────────────────────────────────────────────────────
// Patterns
// ──────────────────────────────────────────────────────────

static YEARS_WITH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<n>\d{1,2})(?:\.\d)?\+?\s*(?:years?|yrs?)\.?(?:\s+of)?(?:\s+(?:professional|hands-on|commercial|production|industry))?(?:\s+(?:experience|exp))?(?:\s+(?:with|in|using|building|on))?\s+(?P<tail>[^,;()|]+)",
    )
    .unwrap()
});

static YEARS_AFTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<skill>[\p{L}\p{N}+#.][\p{L}\p{N}+#. \-]{0,30}?)\s*[(:\-]\s*(?P<n>\d{1,2})\+?\s*(?:years?|yrs?)\b",
    )
    .unwrap()
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").unwrap()
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\(?\d[\d \t().\-]{7,}\d").unwrap());

static LINKEDIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:https?://)?(?:www\.)?linkedin\.com/in/[A-Za-z0-9_\-%]+").unwrap()
});

static STRONG_DEGREE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:ph\.?\s?d|doctorate|doctor of|master's|masters?|mba|bachelor's|bachelors?|associate'?s? degree|diploma|high school)\b",
    )
    .unwrap()
});

/// Abbreviated degrees ("b.s.", "msc") are only trusted inside an education section.
static ABBREV_DEGREE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:^|[\s,(])(?P<d>b\.?sc?|m\.?sc?|b\.?eng|m\.?eng|b\.?tech|m\.?tech|b\.?a|m\.?a)\.?(?:[\s,)]|$)",
    )
    .unwrap()
});

static FIELD_IN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bin\s+(?P<f>\p{L}[\p{L} &]*)").unwrap());
static FIELD_OF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bof\s+(?P<f>\p{L}[\p{L} &]*)").unwrap());

const PHONE_MIN_DIGITS: usize = 9;
const PHONE_MAX_DIGITS: usize = 15;
const MAX_FIELD_TOKENS: usize = 6;
const MAX_KEYWORD_TOKENS: usize = 4;
/// Non-bullet lines longer than this inside an experience read as prose.
const PROSE_MIN_TOKENS: usize = 9;
const MAX_PENDING_HEADER_LINES: usize = 2;

const TITLE_WORDS: &[&str] = &[
    "engineer", "developer", "programmer", "manager", "analyst", "designer", "scientist",
    "consultant", "intern", "lead", "director", "specialist", "architect", "administrator",
    "coordinator", "officer", "associate", "head", "vp", "president", "founder", "co-founder",
    "assistant", "technician", "representative", "accountant", "teacher", "nurse", "researcher",
    "editor", "writer", "strategist", "owner", "executive", "advisor", "sre", "cto", "ceo", "cfo",
    "principal", "fellow", "tester", "recruiter", "instructor",
];

// ──────────────────────────────────────────────────────────
// Extraction
// ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidualKind {
    /// Experience header where title or organization could not be told apart.
    ExperienceHeader,
    /// Bullet with no experience to attach to.
    OrphanBullet,
    /// Skills-section line with no taxonomy hit.
    SkillsLine,
}

impl ResidualKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResidualKind::ExperienceHeader => "experience_header",
            ResidualKind::OrphanBullet => "orphan_bullet",
            ResidualKind::SkillsLine => "skills_line",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidualSpan {
    pub kind: ResidualKind,
    pub text: String,
    /// Index into `profile.experiences` for headers that produced an entry.
    pub experience: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct RuleExtraction {
    pub profile: ExtractedProfile,
    pub residual: Vec<ResidualSpan>,
}

pub fn extract(document: &Document) -> RuleExtraction {
    let sectioned = label_sections(document.lines());
    let mut builder = ProfileBuilder::default();
    builder.profile.contact = extract_contact(document.raw_text());

    for line in &sectioned.lines {
        builder.observe(line);
    }

    // no education header: fall back to unambiguous degree words anywhere
    if !sectioned.present.contains(&ResumeSection::Education) {
        for line in &sectioned.lines {
            builder.education_line(line.text, false);
        }
    }

    builder.finish()
}

#[derive(Default)]
struct ProfileBuilder {
    profile: ExtractedProfile,
    residual: Vec<ResidualSpan>,
    section: Option<ResumeSection>,
    current: Option<usize>,
    current_project: Option<usize>,
    pending: Vec<String>,
    summary: Vec<String>,
}

impl ProfileBuilder {
    fn observe(&mut self, line: &LabeledLine<'_>) {
        if self.section != Some(line.section) {
            self.flush_pending();
            self.current = None;
            self.current_project = None;
            self.section = Some(line.section);
        }

        let skills = self.collect_skills(line);
        let found_skill = !skills.is_empty();
        self.collect_years(line.text);

        match line.section {
            ResumeSection::Summary => self.summary.push(line.text.to_string()),
            ResumeSection::Experience => self.experience_line(line),
            ResumeSection::Projects => self.project_line(line, skills),
            ResumeSection::Education => self.education_line(line.text, true),
            ResumeSection::Skills => {
                self.collect_list_keywords(line.text);
                if !found_skill {
                    self.residual(ResidualKind::SkillsLine, line.text, None);
                }
            }
            ResumeSection::Preamble if line.bullet => {
                self.residual(ResidualKind::OrphanBullet, line.text, None)
            }
            _ => {}
        }
    }

    /// Adds taxonomy skills found on the line and returns their display names.
    fn collect_skills(&mut self, line: &LabeledLine<'_>) -> Vec<&'static str> {
        let list_context = line.section == ResumeSection::Skills
            || line.text.contains([',', '/', '|', ':', ';']);
        let hits = taxonomy::scan(&tokenize(line.text), list_context);
        for hit in &hits {
            if self.profile.skill(&hit.canonical).is_none() {
                self.profile.skills.push(Skill {
                    name: hit.display.to_string(),
                    normalized_name: hit.canonical.clone(),
                    years_experience: None,
                    source: FieldSource::Rules,
                });
            }
        }
        hits.iter().map(|h| h.display).collect()
    }

    fn collect_years(&mut self, text: &str) {
        for caps in YEARS_WITH_RE.captures_iter(text) {
            let tokens: Vec<String> = tokenize(&caps["tail"]).into_iter().take(5).collect();
            let hit = taxonomy::scan(&tokens, true)
                .into_iter()
                .find(|h| h.start <= 1);
            if let (Some(hit), Ok(years)) = (hit, caps["n"].parse::<f32>()) {
                self.set_years(&hit.canonical, hit.display, years);
            }
        }
        for caps in YEARS_AFTER_RE.captures_iter(text) {
            let tokens = tokenize(&caps["skill"]);
            let tail = &tokens[tokens.len().saturating_sub(MAX_KEYWORD_TOKENS)..];
            let hit = taxonomy::scan(tail, true).into_iter().last();
            if let (Some(hit), Ok(years)) = (hit, caps["n"].parse::<f32>()) {
                self.set_years(&hit.canonical, hit.display, years);
            }
        }
    }

    fn set_years(&mut self, canonical: &str, display: &str, years: f32) {
        match self
            .profile
            .skills
            .iter_mut()
            .find(|s| s.normalized_name == canonical)
        {
            Some(skill) => {
                skill.years_experience = Some(skill.years_experience.map_or(years, |y| y.max(years)));
            }
            None => self.profile.skills.push(Skill {
                name: display.to_string(),
                normalized_name: canonical.to_string(),
                years_experience: Some(years),
                source: FieldSource::Rules,
            }),
        }
    }

    fn collect_list_keywords(&mut self, text: &str) {
        for item in text.split([',', ';', '|', '/', '•']) {
            let n = tokenize(item).len();
            if (1..=MAX_KEYWORD_TOKENS).contains(&n) {
                self.profile.keywords.insert(taxonomy::comparison_key(item));
            }
        }
    }

    fn experience_line(&mut self, line: &LabeledLine<'_>) {
        let text = line.text;

        if !line.bullet {
            if let Some(found) = find_date_range(text) {
                let mut parts: Vec<String> = std::mem::take(&mut self.pending)
                    .iter()
                    .flat_map(|p| split_header(p))
                    .collect();
                let remainder = format!("{} {}", &text[..found.span.0], &text[found.span.1..]);
                parts.extend(split_header(&remainder));
                self.start_experience(parts, Some(found.range));
                return;
            }
        }

        if line.bullet {
            if !self.pending.is_empty() {
                let parts: Vec<String> = std::mem::take(&mut self.pending)
                    .iter()
                    .flat_map(|p| split_header(p))
                    .collect();
                self.start_experience(parts, None);
            }
            match self.current {
                Some(idx) => self.profile.experiences[idx]
                    .responsibilities
                    .push(text.to_string()),
                None => self.residual(ResidualKind::OrphanBullet, text, None),
            }
            return;
        }

        let prose = tokenize(text).len() >= PROSE_MIN_TOKENS || text.ends_with('.');
        match self.current {
            Some(idx) if prose => self.profile.experiences[idx]
                .responsibilities
                .push(text.to_string()),
            _ => {
                self.pending.push(text.to_string());
                if self.pending.len() > MAX_PENDING_HEADER_LINES {
                    let dropped = self.pending.remove(0);
                    self.residual(ResidualKind::ExperienceHeader, &dropped, None);
                }
            }
        }
    }

    /// A short non-bullet line opens a project entry; bullets and prose
    /// describe the open one.
    fn project_line(&mut self, line: &LabeledLine<'_>, technologies: Vec<&'static str>) {
        let text = line.text;
        let prose = tokenize(text).len() >= PROSE_MIN_TOKENS || text.ends_with('.');

        let idx = match self.current_project {
            Some(idx) if line.bullet || prose => {
                self.profile.projects[idx].description.push(text.to_string());
                idx
            }
            None if line.bullet => {
                self.residual(ResidualKind::OrphanBullet, text, None);
                return;
            }
            _ => {
                let name = project_name(text);
                let mut description = Vec::new();
                if prose || name.is_empty() {
                    description.push(text.to_string());
                }
                self.profile.projects.push(Project {
                    name: if name.is_empty() { text.to_string() } else { name },
                    technologies: Vec::new(),
                    description,
                    source: FieldSource::Rules,
                });
                self.profile.projects.len() - 1
            }
        };

        let project = &mut self.profile.projects[idx];
        for tech in technologies {
            if !project.technologies.iter().any(|t| t == tech) {
                project.technologies.push(tech.to_string());
            }
        }
    }

    fn start_experience(&mut self, parts: Vec<String>, duration: Option<DateRange>) {
        let (title, organization) = resolve_title_and_org(&parts);
        let idx = self.profile.experiences.len();
        if !parts.is_empty() && (title.is_none() || organization.is_none()) {
            self.residual(ResidualKind::ExperienceHeader, &parts.join(" | "), Some(idx));
        }
        if let Some(title) = &title {
            self.profile.keywords.insert(taxonomy::comparison_key(title));
        }
        self.profile.experiences.push(Experience {
            title,
            organization,
            duration,
            responsibilities: Vec::new(),
            source: FieldSource::Rules,
        });
        self.current = Some(idx);
    }

    fn flush_pending(&mut self) {
        for text in std::mem::take(&mut self.pending) {
            self.residual(ResidualKind::ExperienceHeader, &text, None);
        }
    }

    fn education_line(&mut self, text: &str, in_section: bool) {
        let found = STRONG_DEGREE_RE
            .find(text)
            .map(|m| (m.as_str(), m.end()))
            .or_else(|| {
                if !in_section {
                    return None;
                }
                let caps = ABBREV_DEGREE_RE.captures(text)?;
                Some((caps.name("d")?.as_str(), caps.get(0)?.end()))
            });
        let Some((degree_text, end)) = found else {
            return;
        };

        let degree = degree_name(degree_text);
        let field = field_of_study(&text[end..]);
        let duplicate = self
            .profile
            .education
            .iter()
            .any(|e| e.degree == degree && e.field == field);
        if !duplicate {
            self.profile.education.push(Education {
                degree: degree.to_string(),
                field,
                source: FieldSource::Rules,
            });
        }
    }

    fn residual(&mut self, kind: ResidualKind, text: &str, experience: Option<usize>) {
        self.residual.push(ResidualSpan {
            kind,
            text: text.to_string(),
            experience,
        });
    }

    fn finish(mut self) -> RuleExtraction {
        self.flush_pending();
        if !self.summary.is_empty() {
            self.profile.summary = Some(self.summary.join(" "));
        }
        for skill in &self.profile.skills {
            self.profile.keywords.insert(skill.normalized_name.clone());
        }
        RuleExtraction {
            profile: self.profile,
            residual: self.residual,
        }
    }
}

fn trim_separators(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || ",|-()@·".contains(c))
}

/// Splits an experience header into its parts: "title at org", "a | b", "a, b", "a - b".
fn split_header(text: &str) -> Vec<String> {
    let text = trim_separators(text);
    if text.is_empty() {
        return Vec::new();
    }
    let pieces: Vec<&str> = match text.split_once(" at ") {
        Some((before, after)) => vec![before, after],
        None => text
            .split(['|', ',', '@'])
            .flat_map(|p| p.split(" - "))
            .collect(),
    };
    pieces
        .into_iter()
        .map(trim_separators)
        .filter(|p| p.chars().any(|c| c.is_alphanumeric()))
        .map(str::to_string)
        .collect()
}

/// "ats engine | rust, tokio" → "ats engine".
fn project_name(text: &str) -> String {
    let head = text.split(['|', '(', ':']).next().unwrap_or(text);
    let head = head.split(" - ").next().unwrap_or(head);
    trim_separators(head).to_string()
}

fn has_title_word(text: &str) -> bool {
    tokenize(text)
        .iter()
        .any(|t| TITLE_WORDS.contains(&t.as_str()))
}

/// The part with a job-title word is the title and the first other part is
/// the organization. Without a title word nothing is assigned.
fn resolve_title_and_org(parts: &[String]) -> (Option<String>, Option<String>) {
    let Some(title_idx) = parts.iter().position(|p| has_title_word(p)) else {
        return (None, None);
    };
    let organization = parts
        .iter()
        .enumerate()
        .find(|(i, _)| *i != title_idx)
        .map(|(_, p)| p.clone());
    (Some(parts[title_idx].clone()), organization)
}

fn degree_name(matched: &str) -> &'static str {
    let compact: String = matched.chars().filter(|c| c.is_alphanumeric()).collect();
    if compact.starts_with("ph") || compact.starts_with("doctor") {
        "PhD"
    } else if compact == "mba" {
        "MBA"
    } else if compact.starts_with("associate") {
        "Associate's"
    } else if compact.starts_with("diploma") {
        "Diploma"
    } else if compact.starts_with("highschool") {
        "High School"
    } else if compact.starts_with('m') {
        "Master's"
    } else {
        "Bachelor's"
    }
}

/// "in computer science", "of business administration", or the words up to the
/// first comma ("b.s. computer science, state university").
fn field_of_study(after_degree: &str) -> Option<String> {
    let candidate = FIELD_IN_RE
        .captures(after_degree)
        .or_else(|| FIELD_OF_RE.captures(after_degree))
        .and_then(|c| c.name("f").map(|m| m.as_str().to_string()))
        .or_else(|| {
            let head = after_degree.split([',', '|', '(', ';']).next()?;
            let head = trim_separators(head);
            (!head.chars().any(|c| c.is_ascii_digit())).then(|| head.to_string())
        })?;

    let cut = [" from ", " at "]
        .iter()
        .filter_map(|sep| candidate.find(sep))
        .min()
        .unwrap_or(candidate.len());
    let field = trim_separators(&candidate[..cut]);
    let tokens = tokenize(field).len();
    if tokens == 0 || tokens > MAX_FIELD_TOKENS {
        return None;
    }
    Some(field.to_string())
}

pub fn extract_contact(raw_text: &str) -> ContactInfo {
    let mut contact = ContactInfo::default();
    for line in raw_text.lines() {
        if contact.email.is_none() {
            contact.email = EMAIL_RE.find(line).map(|m| m.as_str().to_lowercase());
        }
        if contact.linkedin.is_none() {
            contact.linkedin = LINKEDIN_RE.find(line).map(|m| m.as_str().to_lowercase());
        }
        if contact.phone.is_none() {
            contact.phone = PHONE_RE
                .find_iter(line)
                .map(|m| m.as_str().trim())
                .find(|candidate| {
                    let digits = candidate.chars().filter(|c| c.is_ascii_digit()).count();
                    (PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits)
                })
                .map(str::to_string);
        }
    }
    contact
}

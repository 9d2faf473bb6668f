//! Skill taxonomy: alias → canonical skill.
//!
//! An entry's first alias is its canonical key ("postgresql", "rest api").
//! Lookups go through the comparison form of each alias, so plurals and case
//! never matter.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::normalizer::{comparison_form, singularize};

pub struct SkillEntry {
    pub display: &'static str,
    /// First alias is the canonical one.
    pub aliases: &'static [&'static str],
}

/// Longest alias in tokens. Bounds the n-gram scan.
const MAX_ALIAS_TOKENS: usize = 4;

/// Aliases that are also ordinary English words or single letters. Only
/// recognized in list-like context (skills sections, comma lists).
const AMBIGUOUS_ALIASES: &[&str] = &[
    "go", "r", "c", "ts", "es", "rest", "node", "swift", "spring", "express", "excel", "shell",
    "ruby", "rails", "lambda", "security", "statistics", "ml", "ai", "ux", "sap",
];

const SKILLS: &[SkillEntry] = &[
    // languages
    SkillEntry { display: "Python", aliases: &["python", "python3", "py"] },
    SkillEntry { display: "Java", aliases: &["java"] },
    SkillEntry { display: "JavaScript", aliases: &["javascript", "js", "ecmascript", "es6"] },
    SkillEntry { display: "TypeScript", aliases: &["typescript", "ts"] },
    SkillEntry { display: "Go", aliases: &["go", "golang"] },
    SkillEntry { display: "Rust", aliases: &["rust", "rustlang"] },
    SkillEntry { display: "C", aliases: &["c"] },
    SkillEntry { display: "C++", aliases: &["c++", "cpp"] },
    SkillEntry { display: "C#", aliases: &["c#", "csharp", "c sharp"] },
    SkillEntry { display: "Ruby", aliases: &["ruby"] },
    SkillEntry { display: "PHP", aliases: &["php"] },
    SkillEntry { display: "Kotlin", aliases: &["kotlin"] },
    SkillEntry { display: "Swift", aliases: &["swift"] },
    SkillEntry { display: "Scala", aliases: &["scala"] },
    SkillEntry { display: "R", aliases: &["r"] },
    SkillEntry { display: "SQL", aliases: &["sql", "t-sql", "pl/sql"] },
    SkillEntry { display: "Bash", aliases: &["bash", "shell", "shell scripting"] },
    SkillEntry { display: "Perl", aliases: &["perl"] },
    SkillEntry { display: "MATLAB", aliases: &["matlab"] },
    SkillEntry { display: "Dart", aliases: &["dart"] },
    SkillEntry { display: "Elixir", aliases: &["elixir"] },
    SkillEntry { display: "Haskell", aliases: &["haskell"] },
    // web
    SkillEntry { display: "React", aliases: &["react", "reactjs", "react.js"] },
    SkillEntry { display: "Angular", aliases: &["angular", "angularjs"] },
    SkillEntry { display: "Vue", aliases: &["vue", "vue.js", "vuejs"] },
    SkillEntry { display: "Next.js", aliases: &["next.js", "nextjs"] },
    SkillEntry { display: "Node.js", aliases: &["node.js", "nodejs", "node"] },
    SkillEntry { display: "Express", aliases: &["express", "express.js", "expressjs"] },
    SkillEntry { display: "Django", aliases: &["django"] },
    SkillEntry { display: "Flask", aliases: &["flask"] },
    SkillEntry { display: "FastAPI", aliases: &["fastapi"] },
    SkillEntry { display: "Spring", aliases: &["spring", "spring boot"] },
    SkillEntry { display: "Ruby on Rails", aliases: &["ruby on rails", "rails"] },
    SkillEntry { display: ".NET", aliases: &["dotnet", "asp.net"] },
    SkillEntry { display: "HTML", aliases: &["html", "html5"] },
    SkillEntry { display: "CSS", aliases: &["css", "css3", "sass", "scss"] },
    SkillEntry { display: "Tailwind", aliases: &["tailwind", "tailwindcss"] },
    SkillEntry { display: "GraphQL", aliases: &["graphql"] },
    SkillEntry { display: "REST APIs", aliases: &["rest api", "rest", "restful", "restful api", "restful service"] },
    SkillEntry { display: "gRPC", aliases: &["grpc"] },
    // data
    SkillEntry { display: "PostgreSQL", aliases: &["postgresql", "postgres", "psql"] },
    SkillEntry { display: "MySQL", aliases: &["mysql", "mariadb"] },
    SkillEntry { display: "MongoDB", aliases: &["mongodb", "mongo"] },
    SkillEntry { display: "Redis", aliases: &["redis"] },
    SkillEntry { display: "Elasticsearch", aliases: &["elasticsearch", "elastic search", "es"] },
    SkillEntry { display: "SQLite", aliases: &["sqlite"] },
    SkillEntry { display: "Cassandra", aliases: &["cassandra"] },
    SkillEntry { display: "DynamoDB", aliases: &["dynamodb"] },
    SkillEntry { display: "Snowflake", aliases: &["snowflake"] },
    SkillEntry { display: "BigQuery", aliases: &["bigquery"] },
    SkillEntry { display: "Spark", aliases: &["spark", "apache spark", "pyspark"] },
    SkillEntry { display: "Hadoop", aliases: &["hadoop"] },
    SkillEntry { display: "Kafka", aliases: &["kafka", "apache kafka"] },
    SkillEntry { display: "Airflow", aliases: &["airflow", "apache airflow"] },
    SkillEntry { display: "dbt", aliases: &["dbt"] },
    SkillEntry { display: "ETL", aliases: &["etl", "elt", "data pipeline"] },
    SkillEntry { display: "Data Warehousing", aliases: &["data warehousing", "data warehouse"] },
    SkillEntry { display: "pandas", aliases: &["pandas"] },
    SkillEntry { display: "NumPy", aliases: &["numpy"] },
    SkillEntry { display: "Tableau", aliases: &["tableau"] },
    SkillEntry { display: "Power BI", aliases: &["power bi", "powerbi"] },
    SkillEntry { display: "Excel", aliases: &["excel", "microsoft excel", "ms excel"] },
    SkillEntry { display: "Looker", aliases: &["looker"] },
    // machine learning
    SkillEntry { display: "Machine Learning", aliases: &["machine learning", "ml"] },
    SkillEntry { display: "Deep Learning", aliases: &["deep learning"] },
    SkillEntry { display: "AI", aliases: &["ai", "artificial intelligence"] },
    SkillEntry { display: "NLP", aliases: &["nlp", "natural language processing"] },
    SkillEntry { display: "Computer Vision", aliases: &["computer vision"] },
    SkillEntry { display: "PyTorch", aliases: &["pytorch", "torch"] },
    SkillEntry { display: "TensorFlow", aliases: &["tensorflow", "keras"] },
    SkillEntry { display: "scikit-learn", aliases: &["scikit-learn", "sklearn", "scikit learn"] },
    SkillEntry { display: "LLMs", aliases: &["llm", "large language model"] },
    SkillEntry { display: "Statistics", aliases: &["statistics", "statistical analysis"] },
    // cloud and operations
    SkillEntry { display: "AWS", aliases: &["aws", "amazon web services"] },
    SkillEntry { display: "GCP", aliases: &["gcp", "google cloud", "google cloud platform"] },
    SkillEntry { display: "Azure", aliases: &["azure", "microsoft azure"] },
    SkillEntry { display: "Docker", aliases: &["docker", "containerization"] },
    SkillEntry { display: "Kubernetes", aliases: &["kubernetes", "k8s"] },
    SkillEntry { display: "Terraform", aliases: &["terraform"] },
    SkillEntry { display: "Ansible", aliases: &["ansible"] },
    SkillEntry { display: "Jenkins", aliases: &["jenkins"] },
    SkillEntry { display: "GitHub Actions", aliases: &["github actions"] },
    SkillEntry { display: "CI/CD", aliases: &["ci/cd", "ci cd", "cicd", "continuous integration", "continuous delivery", "continuous deployment"] },
    SkillEntry { display: "Linux", aliases: &["linux", "unix"] },
    SkillEntry { display: "Git", aliases: &["git", "github", "gitlab", "version control"] },
    SkillEntry { display: "Helm", aliases: &["helm"] },
    SkillEntry { display: "Prometheus", aliases: &["prometheus"] },
    SkillEntry { display: "Grafana", aliases: &["grafana"] },
    SkillEntry { display: "Microservices", aliases: &["microservices", "microservice architecture"] },
    SkillEntry { display: "Serverless", aliases: &["serverless"] },
    SkillEntry { display: "AWS Lambda", aliases: &["aws lambda", "lambda"] },
    SkillEntry { display: "Nginx", aliases: &["nginx"] },
    // practices
    SkillEntry { display: "Agile", aliases: &["agile"] },
    SkillEntry { display: "Scrum", aliases: &["scrum"] },
    SkillEntry { display: "Kanban", aliases: &["kanban"] },
    SkillEntry { display: "TDD", aliases: &["tdd", "test-driven development", "test driven development"] },
    SkillEntry { display: "Unit Testing", aliases: &["unit testing", "unit test"] },
    SkillEntry { display: "Jira", aliases: &["jira"] },
    SkillEntry { display: "Distributed Systems", aliases: &["distributed systems", "distributed computing"] },
    SkillEntry { display: "System Design", aliases: &["system design"] },
    SkillEntry { display: "Data Structures", aliases: &["data structures"] },
    SkillEntry { display: "Algorithms", aliases: &["algorithms"] },
    SkillEntry { display: "OOP", aliases: &["oop", "object-oriented programming", "object oriented programming"] },
    SkillEntry { display: "Security", aliases: &["security", "cybersecurity", "application security"] },
    SkillEntry { display: "DevOps", aliases: &["devops"] },
    // people and business
    SkillEntry { display: "Communication", aliases: &["communication", "communication skills"] },
    SkillEntry { display: "Leadership", aliases: &["leadership", "team leadership"] },
    SkillEntry { display: "Project Management", aliases: &["project management"] },
    SkillEntry { display: "Stakeholder Management", aliases: &["stakeholder management"] },
    SkillEntry { display: "Problem Solving", aliases: &["problem solving", "problem-solving"] },
    SkillEntry { display: "Teamwork", aliases: &["teamwork", "collaboration"] },
    SkillEntry { display: "Mentoring", aliases: &["mentoring", "mentorship", "coaching"] },
    SkillEntry { display: "Product Management", aliases: &["product management"] },
    SkillEntry { display: "Figma", aliases: &["figma"] },
    SkillEntry { display: "UX Design", aliases: &["ux design", "ux", "user experience"] },
    SkillEntry { display: "SEO", aliases: &["seo", "search engine optimization"] },
    SkillEntry { display: "Salesforce", aliases: &["salesforce"] },
    SkillEntry { display: "SAP", aliases: &["sap"] },
    SkillEntry { display: "Accounting", aliases: &["accounting", "bookkeeping"] },
    SkillEntry { display: "Customer Service", aliases: &["customer service", "customer support"] },
];

struct Taxonomy {
    /// comparison form of alias → index into `SKILLS`
    by_alias: HashMap<String, usize>,
    ambiguous: Vec<String>,
}

static TAXONOMY: LazyLock<Taxonomy> = LazyLock::new(|| {
    let mut by_alias = HashMap::new();
    for (idx, entry) in SKILLS.iter().enumerate() {
        for alias in entry.aliases {
            by_alias.entry(comparison_form(alias)).or_insert(idx);
        }
    }
    let ambiguous = AMBIGUOUS_ALIASES.iter().map(|a| comparison_form(a)).collect();
    Taxonomy {
        by_alias,
        ambiguous,
    }
});

/// A taxonomy skill found in a token sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillHit {
    pub canonical: String,
    pub display: &'static str,
    /// Index of the first matched token.
    pub start: usize,
    pub len: usize,
}

/// Canonical key of a known skill, or `None` when `term` is not in the taxonomy.
pub fn canonical_skill(term: &str) -> Option<(String, &'static str)> {
    let key = comparison_form(term);
    TAXONOMY
        .by_alias
        .get(&key)
        .map(|&idx| canonical_of(idx))
}

/// Key used for keyword equality: the canonical skill when `term` is a known
/// alias, otherwise the term's comparison form.
pub fn comparison_key(term: &str) -> String {
    canonical_skill(term)
        .map(|(canonical, _)| canonical)
        .unwrap_or_else(|| comparison_form(term))
}

fn canonical_of(idx: usize) -> (String, &'static str) {
    let entry = &SKILLS[idx];
    let first = entry.aliases.first().copied().unwrap_or(entry.display);
    (first.to_string(), entry.display)
}

/// Words after which an ambiguous alias reads as a technology: "with go".
const TECH_LEAD_INS: &[&str] = &["with", "in", "using"];

/// Longest-match scan of `tokens` for taxonomy skills. Ambiguous aliases
/// ("go", "r", "rest") count only when `list_context` is set or they follow
/// a lead-in such as "with".
pub fn scan(tokens: &[String], list_context: bool) -> Vec<SkillHit> {
    let singular: Vec<String> = tokens.iter().map(|t| singularize(t)).collect();
    let mut hits = Vec::new();
    let mut i = 0;
    while i < singular.len() {
        let mut matched = None;
        let longest = MAX_ALIAS_TOKENS.min(singular.len() - i);
        for n in (1..=longest).rev() {
            let key = singular[i..i + n].join(" ");
            if let Some(&idx) = TAXONOMY.by_alias.get(&key) {
                let lead_in = i > 0 && TECH_LEAD_INS.contains(&singular[i - 1].as_str());
                if !list_context && !lead_in && TAXONOMY.ambiguous.contains(&key) {
                    continue;
                }
                matched = Some((idx, n));
                break;
            }
        }
        match matched {
            Some((idx, n)) => {
                let (canonical, display) = canonical_of(idx);
                hits.push(SkillHit {
                    canonical,
                    display,
                    start: i,
                    len: n,
                });
                i += n;
            }
            None => i += 1,
        }
    }
    hits
}

//! End-to-end tests for `AtsEngine` with scripted language model clients.
//!
//! No network: structured answers come from a queue and embeddings from a
//! deterministic function, so every run sees the same vectors.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use ats_engine::llm_client::{HashEmbedder, PromptSchema};
use ats_engine::models::{Category, Evidence, MatchMethod, Severity};
use ats_engine::{
    AtsEngine, DocumentKind, EngineError, LanguageModelClient, LruEmbeddingCache, ParseOutput,
    ProviderError, ScoringConfig,
};

type EmbedFn = fn(&str) -> Vec<f32>;

struct ScriptedClient {
    answers: Mutex<VecDeque<Result<Value, ProviderError>>>,
    strict_flags: Mutex<Vec<bool>>,
    embed_fn: EmbedFn,
    embed_calls: AtomicUsize,
    embed_delay: Option<Duration>,
}

impl ScriptedClient {
    fn new(embed_fn: EmbedFn) -> Self {
        Self {
            answers: Mutex::new(VecDeque::new()),
            strict_flags: Mutex::new(Vec::new()),
            embed_fn,
            embed_calls: AtomicUsize::new(0),
            embed_delay: None,
        }
    }

    fn with_answers(self, answers: Vec<Result<Value, ProviderError>>) -> Self {
        *self.answers.lock() = answers.into();
        self
    }

    fn with_embed_delay(mut self, delay: Duration) -> Self {
        self.embed_delay = Some(delay);
        self
    }

    fn structured_calls(&self) -> Vec<bool> {
        self.strict_flags.lock().clone()
    }
}

#[async_trait]
impl LanguageModelClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn extract_structured(
        &self,
        schema: &PromptSchema,
        _text: &str,
    ) -> Result<Value, ProviderError> {
        self.strict_flags.lock().push(schema.strict);
        self.answers
            .lock()
            .pop_front()
            .unwrap_or(Err(ProviderError::EmptyContent))
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.embed_delay {
            tokio::time::sleep(delay).await;
        }
        Ok((self.embed_fn)(text))
    }
}

fn hash_embed(text: &str) -> Vec<f32> {
    HashEmbedder::default().embed(text)
}

/// "docker" sits at cosine 0.2 from every other text.
fn docker_oracle(text: &str) -> Vec<f32> {
    if text == "docker" {
        vec![0.2, 0.96f32.sqrt()]
    } else {
        vec![1.0, 0.0]
    }
}

fn engine(client: ScriptedClient) -> (AtsEngine, Arc<ScriptedClient>) {
    let client = Arc::new(client);
    let engine = AtsEngine::new(client.clone());
    (engine, client)
}

const RESUME: &str = "\
Jane Doe
jane.doe@example.com | +1 415 555 0100 | linkedin.com/in/janedoe

Summary
Backend engineer with six years building payment and data systems in Python and Go.

Experience
Senior Software Engineer | Acme Payments | Jan 2019 - Present
• Built a Python service processing 2M transactions per day
• Reduced PostgreSQL query latency by 40%
• Led migration of batch jobs to Kubernetes
Software Engineer | Initech | Jun 2016 - Dec 2018
• Developed data pipelines in Python and SQL

Education
B.S. in Computer Science, State University

Skills
Python, SQL, PostgreSQL, Kubernetes, Go";

const JOB: &str = "\
Backend Engineer

Requirements
• 5+ years of Python experience required
• Strong SQL and PostgreSQL skills
• Experience with Kubernetes
• Must have experience with Terraform

Nice to have
• Docker is a plus
• Familiarity with Kafka";

// ---------------------------------------------------------------------------
// Worked example
// ---------------------------------------------------------------------------

#[tokio::test]
async fn worked_example_scores_about_77() {
    let (engine, _) = engine(ScriptedClient::new(docker_oracle));
    let report = engine
        .score(
            "Skills\nPython, SQL",
            "Python required\nDocker is a plus",
            &ScoringConfig::default(),
        )
        .await
        .unwrap();

    let results = report.match_results();
    assert_eq!(results.len(), 2);

    assert_eq!(results[0].requirement.normalized_keyword, "python");
    assert_eq!(results[0].requirement.category, Category::MustHave);
    assert_eq!(results[0].similarity_score, 1.0);
    assert!(results[0].matched);
    assert_eq!(results[0].method, MatchMethod::Lexical);

    assert_eq!(results[1].requirement.normalized_keyword, "docker");
    assert_eq!(results[1].requirement.category, Category::NiceToHave);
    assert!((results[1].similarity_score - 0.2).abs() < 1e-5);
    assert!(!results[1].matched);

    assert_eq!(report.breakdown().penalty, 0.0);
    assert!((report.overall_score() - 77.142_857).abs() < 0.01);
}

// ---------------------------------------------------------------------------
// Pipeline invariants
// ---------------------------------------------------------------------------

#[tokio::test]
async fn results_follow_requirement_order() {
    let (engine, _) = engine(ScriptedClient::new(hash_embed));
    let config = ScoringConfig::rules_only();

    let parsed = engine
        .parse(JOB, DocumentKind::JobDescription, &config)
        .await
        .unwrap();
    let ParseOutput::JobDescription { requirements, .. } = parsed else {
        panic!("expected job description output");
    };

    let report = engine.score(RESUME, JOB, &config).await.unwrap();
    let results = report.match_results();

    assert_eq!(results.len(), requirements.len());
    for (i, (result, requirement)) in results.iter().zip(requirements.iter()).enumerate() {
        assert_eq!(result.requirement_index, i);
        assert_eq!(&result.requirement, requirement);
        assert!((0.0..=1.0).contains(&result.similarity_score));
    }
    assert!((0.0..=100.0).contains(&report.overall_score()));
}

#[tokio::test]
async fn realistic_resume_matches_listed_skills() {
    let (engine, _) = engine(ScriptedClient::new(hash_embed));
    let report = engine
        .score(RESUME, JOB, &ScoringConfig::rules_only())
        .await
        .unwrap();

    for keyword in ["python", "sql", "postgresql", "kubernetes"] {
        let result = report
            .match_results()
            .iter()
            .find(|r| r.requirement.normalized_keyword == keyword)
            .unwrap_or_else(|| panic!("no requirement for {keyword}"));
        assert!(result.matched, "{keyword} should match");
        assert_eq!(result.method, MatchMethod::Lexical);
        assert!(matches!(result.matched_evidence[0], Evidence::Skill { .. }));
    }

    assert!(report.missing_keywords().contains(&"terraform"));
    assert!(report
        .feedback()
        .iter()
        .any(|f| f.severity == Severity::Critical && f.message.contains("terraform")));
    assert!(report.quality().score > 50);
}

#[tokio::test]
async fn scoring_is_idempotent() {
    let (engine, _) = engine(ScriptedClient::new(hash_embed));
    let config = ScoringConfig::rules_only();
    let first = engine.score(RESUME, JOB, &config).await.unwrap();
    let second = engine.score(RESUME, JOB, &config).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn cached_engine_gives_same_report_with_fewer_embed_calls() {
    let client = Arc::new(ScriptedClient::new(hash_embed));
    let cache = Arc::new(LruEmbeddingCache::new(256));
    let engine = AtsEngine::new(client.clone()).with_cache(cache.clone());
    let config = ScoringConfig::rules_only();

    let first = engine.score(RESUME, JOB, &config).await.unwrap();
    let calls_after_first = client.embed_calls.load(Ordering::SeqCst);
    let second = engine.score(RESUME, JOB, &config).await.unwrap();

    assert_eq!(first, second);
    assert!(calls_after_first > 0);
    assert_eq!(client.embed_calls.load(Ordering::SeqCst), calls_after_first);
    assert!(!cache.is_empty());
}

#[tokio::test]
async fn adding_missing_must_have_keyword_never_lowers_score() {
    let (engine, _) = engine(ScriptedClient::new(hash_embed));
    let config = ScoringConfig::rules_only();
    let job = "Python required\nTerraform required";

    let before = engine
        .score("Skills\nPython, SQL", job, &config)
        .await
        .unwrap();
    let after = engine
        .score("Skills\nPython, SQL, Terraform", job, &config)
        .await
        .unwrap();

    assert!(!before.match_results()[1].matched);
    assert!(after.match_results()[1].matched);
    assert!(after.overall_score() >= before.overall_score());
    assert!(after.breakdown().penalty < before.breakdown().penalty);
}

#[tokio::test]
async fn penalty_never_exceeds_cap() {
    let (engine, _) = engine(ScriptedClient::new(hash_embed));
    let config = ScoringConfig::rules_only();
    let job = "\
Requirements
• Terraform required
• Kafka required
• Scala required
• Haskell required
• Elixir required";

    let report = engine
        .score("Skills\nExcel, Photoshop", job, &config)
        .await
        .unwrap();
    let breakdown = report.breakdown();
    assert!(breakdown.unmatched_must_haves >= 4);
    assert!(breakdown.penalty <= config.must_have_penalty_cap);
    assert_eq!(breakdown.penalty, config.must_have_penalty_cap);
    assert!(report.overall_score() >= 0.0);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_text_is_rejected() {
    let (engine, _) = engine(ScriptedClient::new(hash_embed));
    let config = ScoringConfig::default();

    let err = engine
        .parse("", DocumentKind::Resume, &config)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::EmptyInput(_)));
    assert!(err.is_user_error());

    let err = engine.score(RESUME, "\n  \n", &config).await.unwrap_err();
    assert!(matches!(err, EngineError::EmptyInput(_)));
}

#[tokio::test]
async fn malformed_then_valid_json_yields_normal_profile() {
    let client = ScriptedClient::new(hash_embed).with_answers(vec![
        Err(ProviderError::MalformedJson("expected value at line 1".to_string())),
        Ok(json!({
            "experiences": [
                {"span": 0, "title": "Operations Manager", "organization": "Acme"}
            ]
        })),
    ]);
    let (engine, client) = engine(client);

    let parsed = engine
        .parse(
            "Experience\nAcme | 2019 - 2020\n• Ran ops",
            DocumentKind::Resume,
            &ScoringConfig::default(),
        )
        .await
        .unwrap();

    let ParseOutput::Resume { profile, .. } = parsed else {
        panic!("expected resume output");
    };
    assert_eq!(profile.experiences.len(), 1);
    assert_eq!(
        profile.experiences[0].title.as_deref(),
        Some("operations manager")
    );
    assert_eq!(client.structured_calls(), vec![false, true]);
}

#[tokio::test]
async fn repeated_malformed_output_aborts_scoring() {
    let client = ScriptedClient::new(hash_embed).with_answers(vec![
        Ok(json!({"experiences": "not a list"})),
        Ok(json!({"experiences": "still not a list"})),
    ]);
    let (engine, client) = engine(client);

    let err = engine
        .score(
            "Experience\nAcme | 2019 - 2020\n• Ran ops",
            "Python required",
            &ScoringConfig::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Extraction(_)));
    assert_eq!(client.structured_calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn slow_embeddings_time_out() {
    let client = ScriptedClient::new(hash_embed).with_embed_delay(Duration::from_secs(30));
    let (engine, _) = engine(client);
    let config = ScoringConfig {
        provider_timeout_ms: 500,
        ..ScoringConfig::rules_only()
    };

    let err = engine
        .score("Skills\nPython", "Terraform required", &config)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::ProviderTimeout {
            operation: "embed",
            ..
        }
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn suggested_edits_quote_resume_and_leave_score_alone() {
    let resume = "Experience\nEngineer at Acme\n• responsible for container builds\nSkills\nPython";
    let job = "Python required\nDocker required";
    let client = ScriptedClient::new(hash_embed).with_answers(vec![Ok(json!({
        "edits": [{
            "line": 0,
            "upgraded": "Built Docker images for every service in CI",
            "reason": "Names the missing tool and leads with a verb.",
            "requirement": 1
        }]
    }))]);
    let (engine, client) = engine(client);

    let plain = engine
        .score(resume, job, &ScoringConfig::rules_only())
        .await
        .unwrap();
    let config = ScoringConfig {
        suggest_edits: true,
        ..ScoringConfig::rules_only()
    };
    let report = engine.score(resume, job, &config).await.unwrap();

    assert_eq!(client.structured_calls(), vec![false]);
    assert_eq!(report.overall_score(), plain.overall_score());
    assert_eq!(report.feedback(), plain.feedback());

    let edits = report.suggested_edits();
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].original, "responsible for container builds");
    assert_eq!(edits[0].related_requirement, Some(1));
}

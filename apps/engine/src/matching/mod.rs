//! Matcher: requirements against an extracted profile.
//!
//! Exact keyword hits are decided lexically and never touch the embedder.
//! Everything else is compared by embedding similarity against the profile's
//! skills, keywords, experience titles and responsibility bullets.

pub mod embeddings;

use std::collections::HashMap;

use tracing::{debug, info};

use crate::config::ScoringConfig;
use crate::errors::EngineError;
use crate::extraction::taxonomy;
use crate::models::{
    Category, Evidence, ExtractedProfile, MatchMethod, MatchResult, Requirement, RequirementSet,
};
use crate::normalizer::comparison_form;

pub use embeddings::{
    cosine_similarity, get_or_compute, EmbeddingCache, Embeddings, LruEmbeddingCache, NoCache,
};

/// Scores closer than this are treated as a tie and resolved by evidence rank.
const TIE_EPSILON: f32 = 1e-6;

/// Similarity a requirement needs to count as matched.
pub fn threshold(category: Category, config: &ScoringConfig) -> f32 {
    match category {
        Category::MustHave => config.must_have_threshold,
        Category::NiceToHave => config.nice_to_have_threshold,
    }
}

/// Alias-aware, case- and plural-insensitive key.
fn lexical_key(term: &str) -> String {
    comparison_form(&taxonomy::comparison_key(term))
}

/// Exact-match lookup over a profile's skills and keywords.
struct LexicalIndex {
    skills: HashMap<String, String>,
    keywords: HashMap<String, String>,
}

impl LexicalIndex {
    fn new(profile: &ExtractedProfile) -> Self {
        let mut skills = HashMap::new();
        for skill in &profile.skills {
            skills
                .entry(lexical_key(&skill.normalized_name))
                .or_insert_with(|| skill.name.clone());
        }
        let mut keywords = HashMap::new();
        for keyword in &profile.keywords {
            keywords
                .entry(lexical_key(keyword))
                .or_insert_with(|| keyword.clone());
        }
        Self { skills, keywords }
    }

    fn lookup(&self, keyword: &str) -> Option<Evidence> {
        let key = lexical_key(keyword);
        if key.is_empty() {
            return None;
        }
        if let Some(name) = self.skills.get(&key) {
            return Some(Evidence::Skill { name: name.clone() });
        }
        self.keywords.get(&key).map(|keyword| Evidence::Keyword {
            keyword: keyword.clone(),
        })
    }
}

/// A piece of the profile the semantic pass compares against.
struct ProfileField {
    evidence: Evidence,
    text: String,
}

fn profile_fields(profile: &ExtractedProfile) -> Vec<ProfileField> {
    let mut fields = Vec::new();
    for skill in &profile.skills {
        fields.push(ProfileField {
            evidence: Evidence::Skill {
                name: skill.name.clone(),
            },
            text: skill.name.clone(),
        });
    }
    for keyword in &profile.keywords {
        if profile.skill(keyword).is_some() {
            continue;
        }
        fields.push(ProfileField {
            evidence: Evidence::Keyword {
                keyword: keyword.clone(),
            },
            text: keyword.clone(),
        });
    }
    for (idx, experience) in profile.experiences.iter().enumerate() {
        if let Some(title) = &experience.title {
            fields.push(ProfileField {
                evidence: Evidence::Title {
                    experience: idx,
                    title: title.clone(),
                },
                text: title.clone(),
            });
        }
        for bullet in &experience.responsibilities {
            fields.push(ProfileField {
                evidence: Evidence::Responsibility {
                    experience: idx,
                    text: bullet.clone(),
                },
                text: bullet.clone(),
            });
        }
    }
    for (idx, project) in profile.projects.iter().enumerate() {
        for text in std::iter::once(&project.name).chain(&project.description) {
            fields.push(ProfileField {
                evidence: Evidence::Project {
                    project: idx,
                    text: text.clone(),
                },
                text: text.clone(),
            });
        }
    }
    fields.retain(|f| !f.text.trim().is_empty());
    fields
}

/// Text embedded for a requirement. A requirement split out of a multi-skill
/// sentence is compared by its skill alone so its siblings don't lend it
/// their similarity.
fn query_text(requirement: &Requirement) -> &str {
    if taxonomy::canonical_skill(&requirement.normalized_keyword).is_some() {
        &requirement.normalized_keyword
    } else {
        &requirement.text
    }
}

fn result(
    index: usize,
    requirement: &Requirement,
    evidence: Option<Evidence>,
    similarity: f32,
    method: MatchMethod,
    config: &ScoringConfig,
) -> MatchResult {
    let similarity = similarity.clamp(0.0, 1.0);
    MatchResult {
        requirement_index: index,
        requirement: requirement.clone(),
        matched_evidence: evidence.into_iter().collect(),
        similarity_score: similarity,
        matched: similarity >= threshold(requirement.category, config),
        method,
    }
}

/// Highest-similarity field; ties go to the better-ranked evidence, then to
/// the earlier field.
fn best_field<'a>(
    query: &[f32],
    fields: &'a [ProfileField],
    vectors: &HashMap<String, std::sync::Arc<[f32]>>,
) -> Option<(&'a ProfileField, f32)> {
    let mut best: Option<(&ProfileField, f32)> = None;
    for field in fields {
        let Some(vector) = vectors.get(&embeddings::cache_key(&field.text)) else {
            continue;
        };
        let score = cosine_similarity(query, vector);
        let better = match best {
            None => true,
            Some((current, current_score)) => {
                score > current_score + TIE_EPSILON
                    || ((score - current_score).abs() <= TIE_EPSILON
                        && field.evidence.citation_rank() < current.evidence.citation_rank())
            }
        };
        if better {
            best = Some((field, score));
        }
    }
    best
}

/// One `MatchResult` per requirement, in requirement order.
pub async fn match_requirements(
    profile: &ExtractedProfile,
    requirements: &RequirementSet,
    embeddings: Embeddings<'_>,
    config: &ScoringConfig,
) -> Result<Vec<MatchResult>, EngineError> {
    let index = LexicalIndex::new(profile);
    let mut results: Vec<Option<MatchResult>> = Vec::with_capacity(requirements.len());
    let mut pending = Vec::new();

    for (i, requirement) in requirements.iter().enumerate() {
        match index.lookup(&requirement.normalized_keyword) {
            Some(evidence) => results.push(Some(result(
                i,
                requirement,
                Some(evidence),
                1.0,
                MatchMethod::Lexical,
                config,
            ))),
            None => {
                results.push(None);
                pending.push(i);
            }
        }
    }

    let lexical = requirements.len() - pending.len();
    let fields = profile_fields(profile);

    if !pending.is_empty() && fields.is_empty() {
        debug!(pending = pending.len(), "profile has no fields to compare against");
        for &i in &pending {
            results[i] = Some(result(
                i,
                &requirements.requirements[i],
                None,
                0.0,
                MatchMethod::None,
                config,
            ));
        }
    } else if !pending.is_empty() {
        let mut texts: Vec<&str> = pending
            .iter()
            .map(|&i| query_text(&requirements.requirements[i]))
            .collect();
        texts.extend(fields.iter().map(|f| f.text.as_str()));
        let vectors = embeddings.embed_all(&texts).await?;

        for &i in &pending {
            let requirement = &requirements.requirements[i];
            let key = embeddings::cache_key(query_text(requirement));
            let best = vectors
                .get(&key)
                .and_then(|query| best_field(query, &fields, &vectors));

            results[i] = Some(match best {
                Some((field, score)) if score > 0.0 => result(
                    i,
                    requirement,
                    Some(field.evidence.clone()),
                    score,
                    MatchMethod::Semantic,
                    config,
                ),
                _ => result(i, requirement, None, 0.0, MatchMethod::Semantic, config),
            });
        }
    }

    let results: Vec<MatchResult> = results.into_iter().flatten().collect();
    info!(
        requirements = results.len(),
        lexical,
        semantic = pending.len(),
        matched = results.iter().filter(|r| r.matched).count(),
        "matching complete"
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::llm_client::{HashEmbedder, LanguageModelClient, PromptSchema, ProviderError};
    use crate::models::{Experience, FieldSource, Project, Skill};

    struct HashClient {
        embedder: HashEmbedder,
        calls: AtomicUsize,
    }

    impl HashClient {
        fn new() -> Self {
            Self {
                embedder: HashEmbedder::default(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LanguageModelClient for HashClient {
        fn name(&self) -> &str {
            "hash"
        }

        async fn extract_structured(
            &self,
            _schema: &PromptSchema,
            _text: &str,
        ) -> Result<Value, ProviderError> {
            Err(ProviderError::Unsupported("embeddings only"))
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.embedder.embed(text))
        }
    }

    fn skill(name: &str, normalized: &str) -> Skill {
        Skill {
            name: name.to_string(),
            normalized_name: normalized.to_string(),
            years_experience: None,
            source: FieldSource::Rules,
        }
    }

    fn profile() -> ExtractedProfile {
        ExtractedProfile {
            skills: vec![skill("Python", "python"), skill("Kubernetes", "kubernetes")],
            experiences: vec![Experience {
                title: Some("data engineer".to_string()),
                organization: Some("acme".to_string()),
                duration: None,
                responsibilities: vec!["built batch data pipelines for analytics".to_string()],
                source: FieldSource::Rules,
            }],
            keywords: BTreeSet::from(["python".to_string(), "payment systems".to_string()]),
            ..Default::default()
        }
    }

    fn requirements(list: Vec<Requirement>) -> RequirementSet {
        RequirementSet::new(list)
    }

    #[tokio::test]
    async fn test_exact_keywords_match_lexically_without_embedding() {
        let client = HashClient::new();
        let reqs = requirements(vec![
            Requirement::new("Python required", "python", Category::MustHave, 1.0),
            Requirement::new("k8s experience", "kubernetes", Category::MustHave, 1.0),
            Requirement::new("payment system work", "payment system", Category::NiceToHave, 0.4),
        ]);
        let results = match_requirements(
            &profile(),
            &reqs,
            Embeddings::new(&client, &NoCache, 1000),
            &ScoringConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.matched && r.similarity_score == 1.0));
        assert!(results.iter().all(|r| r.method == MatchMethod::Lexical));
        assert_eq!(
            results[0].matched_evidence,
            vec![Evidence::Skill {
                name: "Python".to_string()
            }]
        );
        assert!(matches!(results[2].matched_evidence[0], Evidence::Keyword { .. }));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_semantic_match_cites_closest_bullet() {
        let client = HashClient::new();
        let reqs = requirements(vec![Requirement::new(
            "experience building data pipelines",
            "building data pipeline",
            Category::MustHave,
            1.0,
        )]);
        let results = match_requirements(
            &profile(),
            &reqs,
            Embeddings::new(&client, &NoCache, 1000),
            &ScoringConfig::default(),
        )
        .await
        .unwrap();

        let r = &results[0];
        assert_eq!(r.method, MatchMethod::Semantic);
        assert!(r.similarity_score > 0.0 && r.similarity_score <= 1.0);
        assert!(matches!(r.matched_evidence[0], Evidence::Responsibility { experience: 0, .. }));
    }

    #[tokio::test]
    async fn test_project_bullets_count_as_evidence() {
        let client = HashClient::new();
        let profile = ExtractedProfile {
            projects: vec![Project {
                name: "weekend hack".to_string(),
                technologies: vec![],
                description: vec!["wrote a compiler backend with register allocation".to_string()],
                source: FieldSource::Rules,
            }],
            ..Default::default()
        };
        let reqs = requirements(vec![Requirement::new(
            "compiler backend experience",
            "compiler backend",
            Category::NiceToHave,
            0.4,
        )]);
        let results = match_requirements(
            &profile,
            &reqs,
            Embeddings::new(&client, &NoCache, 1000),
            &ScoringConfig::default(),
        )
        .await
        .unwrap();

        let r = &results[0];
        assert_eq!(r.method, MatchMethod::Semantic);
        assert!(r.similarity_score > 0.0);
        assert!(matches!(
            &r.matched_evidence[0],
            Evidence::Project { project: 0, text } if text.contains("register allocation")
        ));
    }

    #[tokio::test]
    async fn test_unrelated_requirement_is_unmatched() {
        let client = HashClient::new();
        let reqs = requirements(vec![Requirement::new(
            "forklift certification",
            "forklift certification",
            Category::MustHave,
            1.0,
        )]);
        let results = match_requirements(
            &profile(),
            &reqs,
            Embeddings::new(&client, &NoCache, 1000),
            &ScoringConfig::default(),
        )
        .await
        .unwrap();
        assert!(!results[0].matched);
        assert!(results[0].similarity_score < 0.6);
    }

    #[tokio::test]
    async fn test_empty_profile_scores_zero() {
        let client = HashClient::new();
        let reqs = requirements(vec![Requirement::new(
            "python",
            "python",
            Category::MustHave,
            1.0,
        )]);
        let results = match_requirements(
            &ExtractedProfile::default(),
            &reqs,
            Embeddings::new(&client, &NoCache, 1000),
            &ScoringConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(results[0].method, MatchMethod::None);
        assert_eq!(results[0].similarity_score, 0.0);
        assert!(results[0].matched_evidence.is_empty());
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_requirements_no_results() {
        let client = HashClient::new();
        let results = match_requirements(
            &profile(),
            &RequirementSet::default(),
            Embeddings::new(&client, &NoCache, 1000),
            &ScoringConfig::default(),
        )
        .await
        .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_tie_prefers_skill_evidence() {
        let fields = vec![
            ProfileField {
                evidence: Evidence::Responsibility {
                    experience: 0,
                    text: "docker".to_string(),
                },
                text: "docker".to_string(),
            },
            ProfileField {
                evidence: Evidence::Skill {
                    name: "Docker".to_string(),
                },
                text: "Docker".to_string(),
            },
        ];
        let mut vectors = HashMap::new();
        vectors.insert("docker".to_string(), std::sync::Arc::from(vec![1.0f32, 0.0]));
        let (field, score) = best_field(&[1.0, 0.0], &fields, &vectors).unwrap();
        assert!((score - 1.0).abs() < 1e-6);
        assert_eq!(field.evidence.citation_rank(), 0);
    }

    #[test]
    fn test_thresholds_follow_category() {
        let config = ScoringConfig::default();
        assert_eq!(threshold(Category::MustHave, &config), 0.6);
        assert_eq!(threshold(Category::NiceToHave, &config), 0.5);
    }
}

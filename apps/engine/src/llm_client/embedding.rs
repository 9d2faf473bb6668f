use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use serde_json::Value;
use siphasher::sip::SipHasher13;

use super::{LanguageModelClient, PromptSchema, ProviderError};
use crate::normalizer::{content_tokens, singularize};

/// Fixed seed so embeddings are stable across runs and Rust versions.
/// Changing these changes every vector.
const HASH_SEED_K0: u64 = 0x0123_4567_89ab_cdef;
const HASH_SEED_K1: u64 = 0xfedc_ba98_7654_3210;

pub const DEFAULT_DIMENSION: usize = 512;

const UNIGRAM_WEIGHT: f32 = 1.0;
const BIGRAM_WEIGHT: f32 = 0.5;
const TRIGRAM_WEIGHT: f32 = 0.3;

/// Deterministic feature-hashing embedder.
///
/// Features are content-word unigrams, adjacent content-word bigrams and
/// character trigrams of each content word, signed-hashed into `dimension`
/// buckets and L2-normalized. Shared vocabulary raises cosine similarity, and
/// the trigrams give partial credit to morphological variants
/// ("optimizing" / "optimization").
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn hash_feature(&self, feature: &str) -> u64 {
        let mut hasher = SipHasher13::new_with_keys(HASH_SEED_K0, HASH_SEED_K1);
        feature.hash(&mut hasher);
        hasher.finish()
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = self.hash_feature(feature);
        let idx = (hash % self.dimension as u64) as usize;
        // top bit picks the sign so collisions partially cancel
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[idx] += sign * weight;
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        let words: Vec<String> = content_tokens(text)
            .iter()
            .map(|t| singularize(t))
            .collect();

        for word in &words {
            self.add_feature(&mut vector, &format!("w:{word}"), UNIGRAM_WEIGHT);

            let padded: Vec<char> = format!("^{word}$").chars().collect();
            for window in padded.windows(3) {
                let gram: String = window.iter().collect();
                self.add_feature(&mut vector, &format!("c:{gram}"), TRIGRAM_WEIGHT);
            }
        }
        for pair in words.windows(2) {
            self.add_feature(
                &mut vector,
                &format!("b:{}_{}", pair[0], pair[1]),
                BIGRAM_WEIGHT,
            );
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

/// Offline client: local embeddings, no structured extraction. Used when no
/// provider key is configured; pair it with `model_extraction = false`.
#[derive(Debug, Clone, Default)]
pub struct LocalClient {
    embedder: HashEmbedder,
}

impl LocalClient {
    pub fn new(embedder: HashEmbedder) -> Self {
        Self { embedder }
    }
}

#[async_trait]
impl LanguageModelClient for LocalClient {
    fn name(&self) -> &str {
        "local-hash"
    }

    async fn extract_structured(
        &self,
        _schema: &PromptSchema,
        _text: &str,
    ) -> Result<Value, ProviderError> {
        Err(ProviderError::Unsupported(
            "structured extraction needs a model provider",
        ))
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        Ok(self.embedder.embed(text))
    }
}

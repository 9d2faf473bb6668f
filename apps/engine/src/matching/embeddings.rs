//! Embedding lookup for the semantic matching pass.
//!
//! Vectors are fetched through an injected `EmbeddingCache`; misses go to the
//! client's `embed` under the per-call timeout.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use linked_hash_map::LinkedHashMap;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::errors::EngineError;
use crate::llm_client::LanguageModelClient;

/// Cosine similarity of two vectors, clipped to [0, 1].
///
/// Mismatched dimensions and zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        warn!(
            a_dim = a.len(),
            b_dim = b.len(),
            "embedding dimension mismatch"
        );
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return 0.0;
    }

    let cos = dot / (norm_a.sqrt() * norm_b.sqrt());
    if cos.is_finite() {
        cos.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Key under which a text's embedding is cached: lowercased, whitespace
/// collapsed.
pub fn cache_key(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Storage for embeddings keyed by normalized text.
///
/// Implementations are shared across concurrent requests.
pub trait EmbeddingCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Arc<[f32]>>;
    fn insert(&self, key: String, vector: Arc<[f32]>);
}

/// Cache that never stores anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl EmbeddingCache for NoCache {
    fn get(&self, _key: &str) -> Option<Arc<[f32]>> {
        None
    }

    fn insert(&self, _key: String, _vector: Arc<[f32]>) {}
}

/// Bounded LRU cache. A hit moves the entry to the back; inserting past
/// capacity evicts from the front.
pub struct LruEmbeddingCache {
    entries: Mutex<LinkedHashMap<String, Arc<[f32]>>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LruEmbeddingCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(LinkedHashMap::new()),
            capacity: capacity.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// (hits, misses) since construction.
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

impl EmbeddingCache for LruEmbeddingCache {
    fn get(&self, key: &str) -> Option<Arc<[f32]>> {
        let mut entries = self.entries.lock();
        match entries.get_refresh(key) {
            Some(vector) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(vector))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn insert(&self, key: String, vector: Arc<[f32]>) {
        let mut entries = self.entries.lock();
        entries.insert(key, vector);
        while entries.len() > self.capacity {
            if let Some((evicted, _)) = entries.pop_front() {
                debug!(key = %evicted, "embedding evicted");
            }
        }
    }
}

/// Embedding for `text`, from the cache when present.
pub async fn get_or_compute(
    cache: &dyn EmbeddingCache,
    client: &dyn LanguageModelClient,
    text: &str,
    timeout_ms: u64,
) -> Result<Arc<[f32]>, EngineError> {
    let key = cache_key(text);
    if let Some(vector) = cache.get(&key) {
        return Ok(vector);
    }

    let vector = match tokio::time::timeout(Duration::from_millis(timeout_ms), client.embed(&key))
        .await
    {
        Ok(Ok(vector)) => vector,
        Ok(Err(err)) => return Err(EngineError::from_provider("embed", timeout_ms, err)),
        Err(_) => {
            warn!(timeout_ms, client = client.name(), "embedding call timed out");
            return Err(EngineError::ProviderTimeout {
                operation: "embed",
                timeout_ms,
            });
        }
    };

    let vector: Arc<[f32]> = vector.into();
    cache.insert(key, Arc::clone(&vector));
    Ok(vector)
}

/// Most embedding calls one `embed_all` keeps in flight.
pub const MAX_CONCURRENT_EMBEDS: usize = 8;

/// Borrowed handles the matcher needs to fetch vectors.
#[derive(Clone, Copy)]
pub struct Embeddings<'a> {
    pub client: &'a dyn LanguageModelClient,
    pub cache: &'a dyn EmbeddingCache,
    pub timeout_ms: u64,
}

impl<'a> Embeddings<'a> {
    pub fn new(
        client: &'a dyn LanguageModelClient,
        cache: &'a dyn EmbeddingCache,
        timeout_ms: u64,
    ) -> Self {
        Self {
            client,
            cache,
            timeout_ms,
        }
    }

    /// Embeds every distinct text, at most `MAX_CONCURRENT_EMBEDS` at a time.
    /// Fails on the first error.
    pub async fn embed_all(
        &self,
        texts: &[&str],
    ) -> Result<HashMap<String, Arc<[f32]>>, EngineError> {
        let mut distinct: Vec<String> = texts.iter().map(|t| cache_key(t)).collect();
        distinct.sort();
        distinct.dedup();

        debug!(count = distinct.len(), client = self.client.name(), "embedding texts");

        let vectors: Vec<Arc<[f32]>> = stream::iter(distinct.iter())
            .map(|text| get_or_compute(self.cache, self.client, text, self.timeout_ms))
            .buffered(MAX_CONCURRENT_EMBEDS)
            .try_collect()
            .await?;

        Ok(distinct.into_iter().zip(vectors).collect())
    }
}

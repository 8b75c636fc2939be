//! Explicit judgement cache.
//!
//! Caches terminal accept/reject verdicts keyed by (question, knowledge
//! base, candidate id) so repeated filter runs over the same question do
//! not re-pay judge latency. Timeouts and errors are never cached, so a
//! transient outage does not stick to a candidate.
//!
//! Eviction is LRU with a fixed capacity. Thread-safety contract: all
//! access goes through an internal `parking_lot::Mutex`; share the cache
//! across workers via `Arc<JudgementCache>`. The cache is always passed
//! explicitly, never held in a global.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

use super::verdict::JudgeFields;

pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    question_fingerprint: u64,
    kb_id: String,
    candidate_id: String,
}

pub struct JudgementCache {
    entries: Mutex<LruCache<CacheKey, JudgeFields>>,
}

impl std::fmt::Debug for JudgementCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JudgementCache")
            .field("len", &self.entries.lock().len())
            .finish_non_exhaustive()
    }
}

impl Default for JudgementCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl JudgementCache {
    /// Capacity 0 is coerced to 1; use a small capacity to effectively
    /// disable caching.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("nonzero after max(1)");
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, question: &str, kb_id: &str, candidate_id: &str) -> Option<JudgeFields> {
        let key = Self::key(question, kb_id, candidate_id);
        self.entries.lock().get(&key).cloned()
    }

    pub fn put(&self, question: &str, kb_id: &str, candidate_id: &str, fields: JudgeFields) {
        let key = Self::key(question, kb_id, candidate_id);
        self.entries.lock().put(key, fields);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    fn key(question: &str, kb_id: &str, candidate_id: &str) -> CacheKey {
        let mut hasher = DefaultHasher::new();
        question.trim().to_lowercase().hash(&mut hasher);
        CacheKey {
            question_fingerprint: hasher.finish(),
            kb_id: kb_id.to_string(),
            candidate_id: candidate_id.to_string(),
        }
    }
}

//! Candidate data model shared by fusion, merge, and filtering.
//!
//! A `Candidate` is a scored unit of retrieved text. Per-source scores and
//! ranks are recorded when fusion runs; `fused_score` is always derived by
//! fusion or merge steps, never set by callers. Candidates live for one
//! query and are discarded once the ranked result set is delivered.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Which retrieval source contributed a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Sparse, term-overlap retrieval (BM25-style).
    Lexical,
    /// Dense, embedding-similarity retrieval.
    Vector,
    /// Lexical-only candidate kept via the salvage rule.
    LexicalSalvaged,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lexical => "lexical",
            Self::Vector => "vector",
            Self::LexicalSalvaged => "lexical_salvaged",
        }
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scored unit of retrieved text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Unique within its knowledge base.
    pub id: String,
    pub text: String,
    pub knowledge_base_id: String,
    /// Opaque payload carried through for the caller (section, page, url, ...).
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Raw dense similarity score, if the vector retriever returned this candidate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_score: Option<f64>,
    /// Raw lexical score, if the lexical retriever returned this candidate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lexical_score: Option<f64>,
    /// 1-indexed rank in the vector list (None if absent).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_rank: Option<usize>,
    /// 1-indexed rank in the lexical list (None if absent).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lexical_rank: Option<usize>,
    /// Combined score; derived by fusion/merge, never set directly.
    pub fused_score: f64,
    /// Non-empty once fusion has run.
    #[serde(default)]
    pub provenance: Vec<Provenance>,
}

impl Candidate {
    /// A candidate fresh from a retriever: no ranks, no fused score yet.
    pub fn new(id: impl Into<String>, text: impl Into<String>, kb_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            knowledge_base_id: kb_id.into(),
            metadata: HashMap::new(),
            vector_score: None,
            lexical_score: None,
            vector_rank: None,
            lexical_rank: None,
            fused_score: 0.0,
            provenance: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Dedup key: ids are only unique within their corpus.
    pub fn dedup_key(&self) -> (String, String) {
        (self.knowledge_base_id.clone(), self.id.clone())
    }
}

/// Ordered candidates from one knowledge base plus the KB's own top fused
/// score, used by the adaptive quota strategy.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBaseResult {
    pub kb_id: String,
    pub candidates: Vec<Candidate>,
}

impl KnowledgeBaseResult {
    pub fn new(kb_id: impl Into<String>, candidates: Vec<Candidate>) -> Self {
        Self {
            kb_id: kb_id.into(),
            candidates,
        }
    }

    /// An empty result for a KB whose retriever failed.
    pub fn empty(kb_id: impl Into<String>) -> Self {
        Self::new(kb_id, Vec::new())
    }

    /// Fused score of the best candidate, 0.0 when empty.
    pub fn top_score(&self) -> f64 {
        self.candidates.first().map_or(0.0, |c| c.fused_score)
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }
}

/// The final ordered structure handed to prompt construction.
#[derive(Debug, Clone, Default)]
pub struct RankedResultSet {
    pub candidates: Vec<Candidate>,
    /// Candidates dropped by the final score threshold (audit count).
    pub below_threshold: usize,
}

impl RankedResultSet {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            below_threshold: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }
}

/// Sort candidates by fused score descending, breaking ties by candidate id
/// so identical inputs always produce identical orderings.
pub fn sort_by_fused_score(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.fused_score
            .partial_cmp(&a.fused_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
}

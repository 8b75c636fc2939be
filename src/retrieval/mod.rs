//! Retriever interfaces and the per-knowledge-base hybrid retriever.
//!
//! The engine consumes retrievers, it does not implement them: the lexical
//! side is typically an inverted index (BM25-style), the vector side an
//! embedding index. `HybridRetriever` composes one of each for a single
//! knowledge base and fuses their rankings.

use tracing::warn;

use crate::candidate::{Candidate, KnowledgeBaseResult};
use crate::error::Result;
use crate::fusion::{FusionParams, fuse};

/// Sparse, term-overlap-based search over one corpus.
///
/// Returned candidates must be sorted by lexical score descending with
/// `lexical_score` populated.
pub trait LexicalRetriever: Send + Sync {
    fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<Candidate>>;
}

/// Dense, embedding-similarity search over one corpus.
///
/// Returned candidates must be sorted by similarity descending with
/// `vector_score` populated.
pub trait VectorRetriever: Send + Sync {
    fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<Candidate>>;
}

/// One lexical + one vector retriever for a single knowledge base, fused
/// into a single ranking.
///
/// A failing source degrades to empty rather than failing the retrieval:
/// the healthy source's ranking is still returned.
pub struct HybridRetriever {
    kb_id: String,
    lexical: Box<dyn LexicalRetriever>,
    vector: Box<dyn VectorRetriever>,
    params: FusionParams,
}

impl HybridRetriever {
    pub fn new(
        kb_id: impl Into<String>,
        lexical: Box<dyn LexicalRetriever>,
        vector: Box<dyn VectorRetriever>,
        params: FusionParams,
    ) -> Self {
        Self {
            kb_id: kb_id.into(),
            lexical,
            vector,
            params,
        }
    }

    pub fn kb_id(&self) -> &str {
        &self.kb_id
    }

    /// Retrieve from both sources and fuse. Never fails on a single-source
    /// outage; both sources down yields an empty result.
    pub fn retrieve(&self, query: &str, limit: usize) -> KnowledgeBaseResult {
        let vector_hits = match self.vector.retrieve(query, limit) {
            Ok(hits) => hits,
            Err(err) => {
                warn!(kb = %self.kb_id, error = %err, "vector retriever failed, degrading to lexical only");
                Vec::new()
            }
        };

        let lexical_hits = match self.lexical.retrieve(query, limit) {
            Ok(hits) => hits,
            Err(err) => {
                warn!(kb = %self.kb_id, error = %err, "lexical retriever failed, degrading to vector only");
                Vec::new()
            }
        };

        let mut fused = fuse(&vector_hits, &lexical_hits, &self.params);
        // Retrievers may leave the KB id blank; stamp it here so dedup
        // keys are correct across knowledge bases.
        for candidate in &mut fused {
            candidate.knowledge_base_id = self.kb_id.clone();
        }
        tracing::debug!(
            kb = %self.kb_id,
            vector = vector_hits.len(),
            lexical = lexical_hits.len(),
            fused = fused.len(),
            "hybrid retrieval complete"
        );

        KnowledgeBaseResult::new(self.kb_id.clone(), fused)
    }
}

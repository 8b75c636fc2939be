//! Engine facade.
//!
//! Wires configuration to the three exposed operations: per-KB hybrid
//! retrieval, multi-source merge (with the final score threshold), and
//! concurrent evidence filtering. Retrievers and the judge are injected;
//! the engine owns no indexes and no model.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::candidate::{Candidate, KnowledgeBaseResult, RankedResultSet};
use crate::config::Config;
use crate::error::{QfError, Result};
use crate::filter::{EvidenceFilter, FilterRun, JudgementCache};
use crate::judge::{HttpJudge, Judge};
use crate::merge;
use crate::retrieval::{HybridRetriever, LexicalRetriever, VectorRetriever};

pub struct Engine {
    config: Config,
    retrievers: HashMap<String, HybridRetriever>,
    judge: Option<Arc<dyn Judge>>,
    cache: Arc<JudgementCache>,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        let cache = Arc::new(JudgementCache::new(config.filter.cache_capacity));
        Self {
            config,
            retrievers: HashMap::new(),
            judge: None,
            cache,
        }
    }

    /// Register one knowledge base: a lexical and a vector retriever fused
    /// under the configured fusion parameters. Re-registering a kb_id
    /// replaces the previous pair.
    pub fn register_knowledge_base(
        &mut self,
        kb_id: impl Into<String>,
        lexical: Box<dyn LexicalRetriever>,
        vector: Box<dyn VectorRetriever>,
    ) {
        let kb_id = kb_id.into();
        let retriever =
            HybridRetriever::new(kb_id.clone(), lexical, vector, self.config.fusion_params());
        self.retrievers.insert(kb_id, retriever);
    }

    pub fn with_judge(mut self, judge: Arc<dyn Judge>) -> Self {
        self.judge = Some(judge);
        self
    }

    /// Attach an HTTP judge built from the `[judge]` config section.
    pub fn with_http_judge(self) -> Result<Self> {
        let judge = HttpJudge::new(self.config.judge_http_config())?;
        Ok(self.with_judge(Arc::new(judge)))
    }

    pub fn knowledge_base_ids(&self) -> Vec<&str> {
        self.retrievers.keys().map(String::as_str).collect()
    }

    /// Hybrid retrieval for one knowledge base. Single-source outages
    /// degrade inside the retriever; an unknown kb_id is an error.
    pub fn hybrid_retrieve(&self, query: &str, kb_id: &str) -> Result<KnowledgeBaseResult> {
        let retriever = self
            .retrievers
            .get(kb_id)
            .ok_or_else(|| QfError::SourceUnavailable(format!("unknown knowledge base: {kb_id}")))?;
        Ok(retriever.retrieve(query, self.config.merge.max_results))
    }

    /// Retrieve from every registered knowledge base, in registration-id
    /// order for determinism.
    pub fn retrieve_all(&self, query: &str) -> Vec<KnowledgeBaseResult> {
        let mut ids: Vec<&String> = self.retrievers.keys().collect();
        ids.sort();
        ids.iter()
            .filter_map(|id| self.retrievers.get(*id))
            .map(|r| r.retrieve(query, self.config.merge.max_results))
            .collect()
    }

    /// Merge per-KB rankings under the configured strategy and quotas,
    /// then apply the final score threshold.
    pub fn merge_sources(&self, results: &[KnowledgeBaseResult]) -> RankedResultSet {
        let merged = merge::merge_sources(results, &self.config.merge_params());
        merge::apply_threshold(merged, self.config.merge.final_score_threshold)
    }

    /// Evidence-filter a candidate list against the question.
    ///
    /// # Errors
    ///
    /// [`QfError::MissingConfig`] when no judge is attached;
    /// [`QfError::CriticalFailure`] when the run aborts — the caller is
    /// expected to fall back to the unfiltered candidates.
    pub fn filter_evidence(
        &self,
        question: &str,
        candidates: &[Candidate],
        progress: Option<&mut dyn FnMut(usize, usize)>,
    ) -> Result<FilterRun> {
        let judge = self
            .judge
            .as_ref()
            .ok_or_else(|| QfError::MissingConfig("no judge configured".to_string()))?;

        let params = self.config.filter_params(judge.model());
        let filter = EvidenceFilter::new(Arc::clone(judge), params).with_cache(Arc::clone(&self.cache));
        filter.run(question, candidates, progress)
    }

    /// End-to-end: retrieve from every KB, merge, threshold, filter.
    /// Returns the accepted candidates re-sorted by fused score, or the
    /// thresholded set unfiltered when no judge is attached.
    pub fn answer_candidates(&self, question: &str) -> Result<RankedResultSet> {
        let results = self.retrieve_all(question);
        let ranked = self.merge_sources(&results);

        if self.judge.is_none() || ranked.is_empty() {
            return Ok(ranked);
        }

        let run = self.filter_evidence(question, &ranked.candidates, None)?;
        info!(run_id = %run.run_id, "evidence filter: {}", run.summary());

        Ok(RankedResultSet {
            candidates: run.accepted_sorted(),
            below_threshold: ranked.below_threshold,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

//! End-to-end pipeline tests: stub retrievers and a scripted judge driven
//! through the engine facade.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result as AnyResult;
use qfuse::candidate::Candidate;
use qfuse::config::Config;
use qfuse::engine::Engine;
use qfuse::error::{QfError, Result};
use qfuse::judge::Judge;
use qfuse::retrieval::{LexicalRetriever, VectorRetriever};

struct StubLexical {
    hits: Vec<(&'static str, f64)>,
}

impl LexicalRetriever for StubLexical {
    fn retrieve(&self, _query: &str, limit: usize) -> Result<Vec<Candidate>> {
        Ok(self
            .hits
            .iter()
            .take(limit)
            .map(|(id, score)| {
                let mut c = Candidate::new(*id, format!("passage about {id}"), "");
                c.lexical_score = Some(*score);
                c
            })
            .collect())
    }
}

struct StubVector {
    hits: Vec<(&'static str, f64)>,
}

impl VectorRetriever for StubVector {
    fn retrieve(&self, _query: &str, limit: usize) -> Result<Vec<Candidate>> {
        Ok(self
            .hits
            .iter()
            .take(limit)
            .map(|(id, score)| {
                let mut c = Candidate::new(*id, format!("passage about {id}"), "");
                c.vector_score = Some(*score);
                c
            })
            .collect())
    }
}

struct DownRetriever;

impl LexicalRetriever for DownRetriever {
    fn retrieve(&self, _query: &str, _limit: usize) -> Result<Vec<Candidate>> {
        Err(QfError::SourceUnavailable("index offline".into()))
    }
}

impl VectorRetriever for DownRetriever {
    fn retrieve(&self, _query: &str, _limit: usize) -> Result<Vec<Candidate>> {
        Err(QfError::SourceUnavailable("embedding service down".into()))
    }
}

/// Accepts candidates whose text mentions "answer", rejects the rest.
struct KeywordJudge {
    calls: AtomicUsize,
}

impl Judge for KeywordJudge {
    fn evaluate(&self, _question: &str, candidate_text: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let can = candidate_text.contains("answer");
        Ok(format!(
            "{{\"is_relevant\": true, \"can_answer\": {can}, \"reasoning\": \"keyword match\"}}"
        ))
    }
}

struct TimeoutJudge;

impl Judge for TimeoutJudge {
    fn evaluate(&self, _q: &str, _c: &str) -> Result<String> {
        std::thread::sleep(std::time::Duration::from_secs(30));
        Ok("{\"is_relevant\": true, \"can_answer\": true}".to_string())
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

fn two_kb_engine(config: Config) -> Engine {
    let mut engine = Engine::new(config);
    engine.register_knowledge_base(
        "docs",
        Box::new(StubLexical {
            hits: vec![("answer-1", 0.04), ("noise-1", 0.02)],
        }),
        Box::new(StubVector {
            hits: vec![("answer-1", 0.92), ("answer-2", 0.81), ("noise-2", 0.55)],
        }),
    );
    engine.register_knowledge_base(
        "wiki",
        Box::new(StubLexical {
            hits: vec![("answer-3", 0.03)],
        }),
        Box::new(StubVector {
            hits: vec![("noise-3", 0.7), ("answer-3", 0.6)],
        }),
    );
    engine
}

#[test]
fn full_pipeline_retrieve_merge_filter() -> AnyResult<()> {
    init_tracing();
    let judge = Arc::new(KeywordJudge {
        calls: AtomicUsize::new(0),
    });
    let engine = two_kb_engine(Config::default()).with_judge(judge.clone());

    let ranked = engine.answer_candidates("which passage has the answer?")?;

    assert!(!ranked.is_empty());
    assert!(ranked.candidates.iter().all(|c| c.text.contains("answer")));
    for pair in ranked.candidates.windows(2) {
        assert!(pair[0].fused_score >= pair[1].fused_score);
    }
    assert!(judge.calls.load(Ordering::Relaxed) > 0);
    Ok(())
}

#[test]
fn one_kb_down_degrades_to_the_other() {
    let mut engine = Engine::new(Config::default());
    engine.register_knowledge_base("dead", Box::new(DownRetriever), Box::new(DownRetriever));
    engine.register_knowledge_base(
        "alive",
        Box::new(StubLexical {
            hits: vec![("a1", 0.02)],
        }),
        Box::new(StubVector {
            hits: vec![("a1", 0.9), ("a2", 0.8)],
        }),
    );

    let results = engine.retrieve_all("q");
    let ranked = engine.merge_sources(&results);

    assert!(!ranked.is_empty());
    assert!(
        ranked
            .candidates
            .iter()
            .all(|c| c.knowledge_base_id == "alive")
    );
}

#[test]
fn all_sources_down_is_empty_not_error() {
    let mut engine = Engine::new(Config::default());
    engine.register_knowledge_base("dead", Box::new(DownRetriever), Box::new(DownRetriever));

    let ranked = engine.answer_candidates("q").unwrap();
    assert!(ranked.is_empty());
}

#[test]
fn progress_reaches_total_through_engine() {
    let judge = Arc::new(KeywordJudge {
        calls: AtomicUsize::new(0),
    });
    let engine = two_kb_engine(Config::default()).with_judge(judge);

    let results = engine.retrieve_all("q");
    let ranked = engine.merge_sources(&results);
    let total = ranked.len();

    let mut seen = Vec::new();
    let mut cb = |processed: usize, total: usize| seen.push((processed, total));
    let run = engine
        .filter_evidence("q", &ranked.candidates, Some(&mut cb))
        .unwrap();

    assert_eq!(run.total(), total);
    assert_eq!(seen.len(), total);
    assert_eq!(seen.last(), Some(&(total, total)));
    for pair in seen.windows(2) {
        assert!(pair[1].0 > pair[0].0);
    }
}

#[test]
fn systemic_timeouts_surface_critical_failure() {
    init_tracing();
    let mut config = Config::default();
    config.filter.per_call_timeout_secs = 1;
    config.filter.max_retries = 0;
    config.filter.max_workers = 8;
    let engine = two_kb_engine(config).with_judge(Arc::new(TimeoutJudge));

    let err = engine.answer_candidates("q").unwrap_err();

    assert!(matches!(err, QfError::CriticalFailure { .. }));
}

#[test]
fn repeated_question_hits_judgement_cache() {
    let judge = Arc::new(KeywordJudge {
        calls: AtomicUsize::new(0),
    });
    let engine = two_kb_engine(Config::default()).with_judge(judge.clone());

    let results = engine.retrieve_all("q");
    let ranked = engine.merge_sources(&results);

    let first = engine.filter_evidence("q", &ranked.candidates, None).unwrap();
    let calls_after_first = judge.calls.load(Ordering::Relaxed);
    let second = engine.filter_evidence("q", &ranked.candidates, None).unwrap();

    assert_eq!(first.cache_hits, 0);
    assert_eq!(second.cache_hits, ranked.len());
    assert_eq!(judge.calls.load(Ordering::Relaxed), calls_after_first);
}

#[test]
fn per_model_override_lowers_worker_count() {
    struct NamedJudge;
    impl Judge for NamedJudge {
        fn evaluate(&self, _q: &str, _c: &str) -> Result<String> {
            Ok("{\"is_relevant\": true, \"can_answer\": true}".to_string())
        }
        fn model(&self) -> &str {
            "gentle-model-v1"
        }
    }

    let mut config = Config::default();
    config.filter.model_overrides.insert(
        "gentle-model".to_string(),
        qfuse::config::ModelOverride {
            max_workers: Some(1),
            per_call_timeout_secs: Some(60),
        },
    );
    let params = config.filter_params("gentle-model-v1");
    assert_eq!(params.max_workers, 1);

    // The engine still completes the run under the override.
    let engine = two_kb_engine(config).with_judge(Arc::new(NamedJudge));
    let ranked = engine.answer_candidates("q").unwrap();
    assert!(!ranked.is_empty());
}

//! qfuse — retrieval fusion and evidence filtering for knowledge QA.
//!
//! Pipeline: query → {lexical, vector} retrieval per knowledge base →
//! weighted Reciprocal Rank Fusion per KB → N-ary quota merge across KBs →
//! score threshold → concurrent per-candidate evidence filtering against an
//! external judge → ranked result set.
//!
//! The crate consumes retrievers and judges, it does not implement them:
//! inject [`retrieval::LexicalRetriever`] / [`retrieval::VectorRetriever`]
//! implementations per KB and a [`judge::Judge`] (an HTTP-backed one is
//! provided), then drive the pipeline through [`engine::Engine`].

pub mod candidate;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod fusion;
pub mod judge;
pub mod keywords;
pub mod merge;
pub mod retrieval;
pub mod retry;

pub use candidate::{Candidate, KnowledgeBaseResult, Provenance, RankedResultSet};
pub use config::Config;
pub use engine::Engine;
pub use error::{QfError, Result};
pub use filter::{EvidenceFilter, FilterRun, FilterRunStatus, Verdict};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

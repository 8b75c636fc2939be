//! The external judge interface.
//!
//! A judge is an LLM-backed service asked, per candidate, whether the
//! candidate can answer the question. It is opaque, possibly slow, and
//! possibly failing; the engine treats it as a blocking RPC returning raw
//! text that [`crate::filter::verdict`] parses defensively.

pub mod http;

pub use http::{HttpJudge, HttpJudgeConfig};

use crate::error::Result;

/// An opaque per-candidate judgement call.
///
/// Implementations must be shareable across the evidence filter's worker
/// threads. A call that blocks past the filter's per-call deadline is
/// abandoned by the engine; implementations should still carry their own
/// transport timeout so abandoned calls eventually unwind.
pub trait Judge: Send + Sync {
    /// Ask whether `candidate_text` can answer `question`. Returns the raw
    /// reply text, structured or not.
    fn evaluate(&self, question: &str, candidate_text: &str) -> Result<String>;

    /// Model identifier used to resolve per-model worker/timeout overrides.
    fn model(&self) -> &str {
        "default"
    }
}

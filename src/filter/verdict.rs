//! Defensive parsing of judge replies.
//!
//! Judge models reply in whatever shape they feel like: clean JSON, JSON
//! wrapped in markdown fences, or free prose. Parsing is modeled as a
//! tagged union rather than nested fallbacks: a reply is `Structured`
//! (valid JSON fields), `Heuristic` (fields extracted from prose), or
//! `Unparseable`. An unparseable reply is a failed attempt, never silently
//! treated as "not answerable".

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Terminal per-candidate verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Relevant and sufficient to answer the question.
    RelevantAnswerable,
    /// On topic but not enough to answer.
    RelevantUnanswerable,
    Irrelevant,
    Timeout,
    Error,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RelevantAnswerable => "relevant_answerable",
            Self::RelevantUnanswerable => "relevant_unanswerable",
            Self::Irrelevant => "irrelevant",
            Self::Timeout => "timeout",
            Self::Error => "error",
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::RelevantAnswerable)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fields extracted from a judge reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JudgeFields {
    pub is_relevant: bool,
    pub can_answer: bool,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_passage: Option<String>,
}

impl JudgeFields {
    pub fn verdict(&self) -> Verdict {
        match (self.is_relevant, self.can_answer) {
            (true, true) => Verdict::RelevantAnswerable,
            (true, false) => Verdict::RelevantUnanswerable,
            (false, _) => Verdict::Irrelevant,
        }
    }
}

/// Outcome of parsing one raw judge reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedVerdict {
    /// The reply was valid JSON carrying the expected fields.
    Structured(JudgeFields),
    /// Fields were recovered from loosely-structured prose.
    Heuristic(JudgeFields),
    /// Nothing usable; the attempt failed.
    Unparseable,
}

impl ParsedVerdict {
    pub fn fields(&self) -> Option<&JudgeFields> {
        match self {
            Self::Structured(f) | Self::Heuristic(f) => Some(f),
            Self::Unparseable => None,
        }
    }
}

// Raw JSON shape: booleans may arrive as true/false, "yes"/"no", or "true"/"false".
#[derive(Debug, Deserialize)]
struct RawStructured {
    #[serde(alias = "relevant")]
    is_relevant: Option<serde_json::Value>,
    #[serde(alias = "answerable")]
    can_answer: Option<serde_json::Value>,
    #[serde(default, alias = "reason", alias = "explanation")]
    reasoning: String,
    #[serde(default, alias = "passage", alias = "evidence")]
    key_passage: Option<String>,
}

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{.*\}").expect("fence regex")
});
static YES_ANSWER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:can[ _]?answer|answerable)\b[^a-z]{0,5}(yes|no|true|false)").expect("answer regex")
});
static YES_RELEVANT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:is[ _]?relevant|relevant)\b[^a-z]{0,5}(yes|no|true|false)").expect("relevant regex")
});
static NEGATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:not relevant|irrelevant|cannot answer|can't answer|does not answer|insufficient)\b")
        .expect("negation regex")
});
static QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([^"]{20,})""#).expect("quote regex")
});

/// Parse a raw judge reply.
pub fn parse_reply(raw: &str) -> ParsedVerdict {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ParsedVerdict::Unparseable;
    }

    if let Some(fields) = try_structured(trimmed) {
        return ParsedVerdict::Structured(fields);
    }

    if let Some(fields) = try_heuristic(trimmed) {
        return ParsedVerdict::Heuristic(fields);
    }

    ParsedVerdict::Unparseable
}

fn try_structured(raw: &str) -> Option<JudgeFields> {
    // Direct JSON first, then the first {...} block (markdown fences,
    // leading prose).
    let parsed: Option<RawStructured> = serde_json::from_str(raw).ok().or_else(|| {
        FENCE_RE
            .find(raw)
            .and_then(|m| serde_json::from_str(m.as_str()).ok())
    });

    let raw_fields = parsed?;
    let is_relevant = coerce_bool(raw_fields.is_relevant.as_ref())?;
    // A reply that only states relevance defaults answerability to false
    // when irrelevant, and is otherwise incomplete.
    let can_answer = match coerce_bool(raw_fields.can_answer.as_ref()) {
        Some(v) => v,
        None if !is_relevant => false,
        None => return None,
    };

    Some(JudgeFields {
        is_relevant,
        can_answer,
        reasoning: raw_fields.reasoning,
        key_passage: raw_fields.key_passage.filter(|p| !p.trim().is_empty()),
    })
}

fn coerce_bool(value: Option<&serde_json::Value>) -> Option<bool> {
    match value? {
        serde_json::Value::Bool(b) => Some(*b),
        serde_json::Value::String(s) => match s.trim().to_lowercase().as_str() {
            "yes" | "true" => Some(true),
            "no" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn try_heuristic(raw: &str) -> Option<JudgeFields> {
    let answer_signal = YES_ANSWER_RE
        .captures(raw)
        .map(|c| matches!(c[1].to_lowercase().as_str(), "yes" | "true"));
    let relevant_signal = YES_RELEVANT_RE
        .captures(raw)
        .map(|c| matches!(c[1].to_lowercase().as_str(), "yes" | "true"));
    let negated = NEGATION_RE.is_match(raw);

    // Require at least one explicit signal; a bare paragraph is unparseable.
    if answer_signal.is_none() && relevant_signal.is_none() && !negated {
        return None;
    }

    let can_answer = answer_signal.unwrap_or(false) && !negated;
    let is_relevant = relevant_signal.unwrap_or(can_answer) && !raw.to_lowercase().contains("irrelevant");

    let key_passage = QUOTED_RE
        .captures(raw)
        .map(|c| c[1].to_string());

    Some(JudgeFields {
        is_relevant,
        can_answer,
        reasoning: raw.chars().take(500).collect(),
        key_passage,
    })
}

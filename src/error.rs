use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QfError {
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Judge call failed: {0}")]
    JudgeCall(String),

    #[error("Judge reply unparseable: {0}")]
    JudgeReply(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error(
        "Critical failure: {timeouts} timeouts and {errors} errors out of {total} candidates \
         exceeded the failure ratio {ratio}"
    )]
    CriticalFailure {
        timeouts: usize,
        errors: usize,
        total: usize,
        ratio: f64,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing required config: {0}")]
    MissingConfig(String),

    #[error("Invalid quota: {0}")]
    InvalidQuota(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl QfError {
    /// Whether a judge-path error is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            QfError::Timeout(_) | QfError::JudgeCall(_) | QfError::Http(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, QfError>;

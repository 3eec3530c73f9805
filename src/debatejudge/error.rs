use crate::debatejudge::judge::JudgingError;
use crate::debatejudge::remote_agent::RemoteAgentError;
use crate::debatejudge::request::ValidationError;
use thiserror::Error;

/// Any failure that ends a debate run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DebateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    RemoteAgent(#[from] RemoteAgentError),
    #[error(transparent)]
    Judging(#[from] JudgingError),
    #[error("could not serialise result: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for DebateError {
    fn from(err: serde_json::Error) -> Self {
        DebateError::Serialization(err.to_string())
    }
}

impl DebateError {
    /// Short category name, for logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            DebateError::Validation(_) => "validation",
            DebateError::RemoteAgent(_) => "remote_agent",
            DebateError::Judging(_) => "judging",
            DebateError::Serialization(_) => "serialization",
        }
    }
}

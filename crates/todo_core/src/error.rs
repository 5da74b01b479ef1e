use shared::domain::TaskId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("remote store returned {status}: {message}")]
    Remote { status: u16, message: String },
    #[error("{0}")]
    Validation(String),
    #[error("failed to decode store response: {0}")]
    Decode(String),
    #[error("store returned no records for {operation}")]
    EmptyResponse { operation: &'static str },
    #[error("no task with id {0}")]
    UnknownTask(TaskId),
    #[error("failed to build http client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("invalid base url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
}

impl SyncError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Failures the user fixes locally; these never reach the error banner.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::UnknownTask(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            Self::Network(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}

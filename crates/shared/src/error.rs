use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error payload returned by the record store alongside a non-success status.
///
/// The store uses two shapes: a bare code (`{"error":"NOT_FOUND"}`) and a
/// typed object (`{"error":{"type":"...","message":"..."}}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreErrorBody {
    pub error: StoreError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreError {
    Detailed {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        message: Option<String>,
    },
    Code(String),
}

impl StoreErrorBody {
    pub fn message(&self) -> String {
        match &self.error {
            StoreError::Detailed {
                kind,
                message: Some(message),
            } => format!("{kind}: {message}"),
            StoreError::Detailed { kind, message: None } => kind.clone(),
            StoreError::Code(code) => code.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {what}: '{value}'")]
pub struct ParseValueError {
    pub what: &'static str,
    pub value: String,
}

impl ParseValueError {
    pub fn new(what: &'static str, value: impl Into<String>) -> Self {
        Self {
            what,
            value: value.into(),
        }
    }
}

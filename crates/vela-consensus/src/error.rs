use thiserror::Error;

/// Errors that can occur decoding consensus data.
#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("Truncated consensus field: expected at least {expected} bytes, got {actual}")]
    TruncatedField { expected: usize, actual: usize },

    #[error("Missing document field: {0}")]
    MissingField(&'static str),

    #[error("JSON error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for ConsensusError {
    fn from(e: serde_json::Error) -> Self {
        ConsensusError::Json(e.to_string())
    }
}

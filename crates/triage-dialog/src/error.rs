//! Error types for the dialogue engine.

use triage_core::error::TriageError;

/// Failures of the remote phrasing adapter.
///
/// These never leave the dialogue engine: any of them selects the policy's
/// own question instead.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PhrasingError {
    #[error("phrasing is disabled")]
    Disabled,
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("request timeout after {0} seconds")]
    Timeout(u64),
    #[error("invalid JSON response: {0}")]
    InvalidJson(String),
    #[error("model returned no question")]
    EmptyQuestion,
}

/// Errors from the dialogue engine.
#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
    #[error("privacy consent is required before the conversation starts")]
    ConsentRequired,
    #[error("age must be between 1 and 120, got {0}")]
    InvalidAge(u8),
    #[error("diagnosis needs {required} question/answer pairs, only {pairs} so far")]
    DiagnosisUnavailable { pairs: u32, required: u32 },
    #[error("no diagnosis has been made yet")]
    NoDiagnosis,
    #[error("conversation already diagnosed; restart to continue")]
    Finished,
    #[error("state lock poisoned: {0}")]
    StateLock(String),
}

impl From<DialogError> for TriageError {
    fn from(err: DialogError) -> Self {
        match err {
            DialogError::SessionNotFound(_) => TriageError::Session(err.to_string()),
            other => TriageError::Dialog(other.to_string()),
        }
    }
}

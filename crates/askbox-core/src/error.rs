use thiserror::Error;

/// Why a question could not be answered. The user only ever sees one
/// generic message; the variants exist for the diagnostic log.
#[derive(Debug, Error)]
pub enum AskError {
    #[error("could not reach endpoint: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("endpoint returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("response body is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("request task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

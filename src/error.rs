use thiserror::Error;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("{0}")]
    Validation(String),
    #[error("Gemini API Error: No images were generated. The prompt may have been rejected.")]
    EmptyResult,
    #[error("Gemini API Error: {0}")]
    MalformedResponse(String),
    #[error("Gemini API Error: {0}")]
    Service(String),
    #[error("Persisted state is corrupt: {0}")]
    PersistedStateCorrupt(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StudioError {
    fn from(e: serde_json::Error) -> Self {
        StudioError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for StudioError {
    fn from(e: reqwest::Error) -> Self {
        StudioError::Service(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;

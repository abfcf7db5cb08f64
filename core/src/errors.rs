use thiserror::Error;

/// Marker the Gemini API puts in quota errors, independent of the HTTP status.
const RESOURCE_EXHAUSTED: &str = "RESOURCE_EXHAUSTED";

/// Aura core errors
#[derive(Error, Debug)]
pub enum AuraError {
    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("Request Error: {0}")]
    RequestError(String),

    #[error("Response Error: {0}")]
    ResponseError(String),

    #[error("Parsing Error: {0}")]
    ParsingError(String),

    #[error("HTTP Error: {status_code} - {message}")]
    HttpError { status_code: u16, message: String },

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Session has ended")]
    SessionClosed,

    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),

    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

impl AuraError {
    /// True when the failure is the API telling us to slow down.
    ///
    /// Only these failures are retried with backoff.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            AuraError::HttpError {
                status_code,
                message,
            } => *status_code == 429 || message.contains(RESOURCE_EXHAUSTED),
            AuraError::RequestError(message) | AuraError::ResponseError(message) => {
                message.contains(RESOURCE_EXHAUSTED)
            }
            AuraError::ReqwestError(e) => {
                e.status().map(|s| s.as_u16()) == Some(429)
            }
            _ => false,
        }
    }

    /// True when the model answered but the answer could not be used.
    pub fn is_malformed(&self) -> bool {
        matches!(self, AuraError::ParsingError(_) | AuraError::SerdeError(_))
    }
}

/// Result type for Aura operations
pub type AuraResult<T> = Result<T, AuraError>;

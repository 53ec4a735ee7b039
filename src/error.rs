//! Error types for the hallbook client

use thiserror::Error;

/// Result type alias for hallbook operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the library
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// The API error behind this error, if any.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }
}

/// API-related errors
///
/// Every variant is classifiable: callers can tell an expired session from a
/// validation failure from a backend outage without parsing messages.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Session expired or missing. Sign in again.")]
    Unauthorized,

    #[error("Request rejected ({status}): {message}")]
    Client { status: u16, message: String },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request failed after {attempts} attempts: {last}")]
    RequestFailed { attempts: u32, last: Box<ApiError> },

    #[error("Request cancelled")]
    Cancelled,
}

impl ApiError {
    /// HTTP status carried by this error.
    ///
    /// For `RequestFailed` this is the status of the last attempt.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Client { status, .. } | ApiError::Server { status, .. } => Some(*status),
            ApiError::RequestFailed { last, .. } => last.status(),
            _ => None,
        }
    }

    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Server { .. } | ApiError::Network(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("Request timed out".to_string())
        } else if err.is_connect() {
            ApiError::Network("Failed to connect to API".to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Session storage errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Could not determine home directory for session storage")]
    NoHome,

    #[error("Session storage I/O error: {0}")]
    Io(String),

    #[error("Corrupt session file: {0}")]
    Parse(String),
}

impl From<serde_yaml::Error> for SessionError {
    fn from(err: serde_yaml::Error) -> Self {
        SessionError::Parse(err.to_string())
    }
}

//! Error types for completion calls.
//!
//! # Transient vs. permanent
//!
//! | Error | Cause | Recoverable |
//! |-------|-------|-------------|
//! | `NetworkError` | Connection refused, reset, DNS | yes |
//! | `Timeout` | Request exceeded the client timeout | yes |
//! | `RateLimited` | HTTP 429 | yes |
//! | `ApiError` | HTTP 5xx or unexpected status | yes |
//! | `SerializationError` | Malformed response body | yes |
//! | `EmptyResponse` | `choices` array was empty | yes |
//! | `AuthError` | HTTP 401/403, bad `OPENAI_API_KEY` | no |
//! | `InvalidRequest` | Model/endpoint mismatch, bad sampling parameters, HTTP 400 | no |
//! | `ModelNotFound` | Unknown model string, HTTP 404 | no |
//! | `ConfigError` | Missing credential, unbuildable HTTP client | no |
//!
//! The default retry policy retries every error returned by the transport;
//! [`LlmError::is_recoverable`] is consulted only when the caller opts into
//! [`RetryOn::Transient`](crate::retry::RetryOn::Transient).

use thiserror::Error;

/// Result type for completion operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors that can occur while issuing a completion.
#[derive(Debug, Error)]
pub enum LlmError {
    /// API error from the provider.
    #[error("API error: {0}")]
    ApiError(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Invalid request parameters.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication error.
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Model not found.
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Network error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Timeout error.
    #[error("Request timed out")]
    Timeout,

    /// The provider answered without any choices.
    #[error("Response contained no choices")]
    EmptyResponse,
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if err.is_connect() {
            LlmError::NetworkError(format!("Connection failed: {}", err))
        } else {
            LlmError::NetworkError(err.to_string())
        }
    }
}

impl LlmError {
    /// Map a non-success HTTP status and its error message to an error.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 => Self::InvalidRequest(message),
            401 | 403 => Self::AuthError(message),
            404 => Self::ModelNotFound(message),
            408 => Self::Timeout,
            429 => Self::RateLimited(message),
            _ => Self::ApiError(format!("HTTP {}: {}", status, message)),
        }
    }

    /// Check if this error is transient and worth retrying.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::AuthError(_) | Self::InvalidRequest(_) | Self::ModelNotFound(_) | Self::ConfigError(_)
        )
    }

    /// Get a user-friendly description of the error with suggested action.
    ///
    /// # Example
    ///
    /// ```
    /// use resilient_llm::LlmError;
    ///
    /// let error = LlmError::AuthError("invalid key".to_string());
    /// assert!(error.user_description().contains("OPENAI_API_KEY"));
    /// ```
    pub fn user_description(&self) -> String {
        match self {
            Self::NetworkError(_) => {
                "Unable to connect to the API. Check your internet connection.".to_string()
            }
            Self::Timeout => "Request timed out. The server may be overloaded.".to_string(),
            Self::RateLimited(_) => "Rate limited by the API. Backing off before retry.".to_string(),
            Self::AuthError(_) => {
                "Authentication failed. Check that OPENAI_API_KEY is valid and not expired."
                    .to_string()
            }
            Self::ModelNotFound(model) => format!(
                "Model '{}' is not available. Use gpt-4, gpt-3.5-turbo or text-davinci-003.",
                model
            ),
            Self::InvalidRequest(msg) => format!("Invalid request: {}. Check your parameters.", msg),
            Self::ConfigError(msg) => format!("Configuration error: {}.", msg),
            Self::ApiError(_) => "API server error.".to_string(),
            Self::EmptyResponse => "The API returned no completion choices.".to_string(),
            Self::SerializationError(_) => {
                "Failed to parse API response. This may be a temporary issue.".to_string()
            }
        }
    }
}

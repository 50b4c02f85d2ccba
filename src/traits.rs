//! Request types and the transport seam.
//!
//! [`CompletionTransport`] performs exactly one HTTP exchange and returns the
//! raw body. Everything above it (validation, payload shape, retries,
//! response extraction) lives in the invoker, so a test double only has to
//! script bodies and errors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{LlmError, Result};
use crate::model::{EndpointStyle, Model};

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.0;
/// Default completion length.
pub const DEFAULT_MAX_TOKENS: u32 = 256;

/// A single completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    #[serde(default)]
    pub model: Model,
    /// Sampling temperature (0.0 = deterministic).
    #[serde(default)]
    pub temperature: f32,
    /// Maximum number of tokens to generate.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Stop sequences.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

impl CompletionRequest {
    /// Request for `prompt` with default model and sampling parameters.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: Model::default(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            stop: None,
        }
    }

    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set stop sequences. An empty list clears them.
    pub fn with_stop<I, S>(mut self, stop: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stop: Vec<String> = stop.into_iter().map(Into::into).collect();
        self.stop = if stop.is_empty() { None } else { Some(stop) };
        self
    }

    /// Endpoint style the model is served from.
    pub fn endpoint_style(&self) -> EndpointStyle {
        self.model.endpoint_style()
    }

    /// Check the request can be sent to `style`.
    ///
    /// Precondition failures are [`LlmError::InvalidRequest`] and are raised
    /// before any network call.
    pub fn validate_for(&self, style: EndpointStyle) -> Result<()> {
        self.model.ensure_supports(style)?;

        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(LlmError::InvalidRequest(format!(
                "temperature must be a finite value >= 0, got {}",
                self.temperature
            )));
        }

        if self.max_tokens == 0 {
            return Err(LlmError::InvalidRequest(
                "max_tokens must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Role of a chat message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// One outbound HTTP exchange with a completion provider.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Name of the provider behind this transport.
    fn name(&self) -> &str;

    /// POST `body` to the endpoint for `style`.
    ///
    /// Returns the raw response body on success. Non-success statuses and
    /// network failures are mapped to [`LlmError`].
    async fn send(&self, style: EndpointStyle, body: &JsonValue) -> Result<String>;
}

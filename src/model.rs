//! Supported models and the endpoint style each one is served from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LlmError;

/// Which completion endpoint a request is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointStyle {
    /// Prompt in, text out (`/completions`).
    Legacy,
    /// Message list in, text out (`/chat/completions`).
    Chat,
}

impl EndpointStyle {
    /// Path of the endpoint relative to the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Legacy => "completions",
            Self::Chat => "chat/completions",
        }
    }
}

impl fmt::Display for EndpointStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::Chat => write!(f, "chat"),
        }
    }
}

/// Model identifiers accepted by the invoker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Model {
    #[serde(rename = "gpt-4")]
    Gpt4,
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
    /// Only served by the legacy completion endpoint.
    #[default]
    #[serde(rename = "text-davinci-003")]
    TextDavinci003,
}

impl Model {
    pub const ALL: [Model; 3] = [Model::Gpt4, Model::Gpt35Turbo, Model::TextDavinci003];

    /// Provider-side model string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gpt4 => "gpt-4",
            Self::Gpt35Turbo => "gpt-3.5-turbo",
            Self::TextDavinci003 => "text-davinci-003",
        }
    }

    /// Endpoint style this model is served from.
    pub fn endpoint_style(&self) -> EndpointStyle {
        match self {
            Self::TextDavinci003 => EndpointStyle::Legacy,
            Self::Gpt4 | Self::Gpt35Turbo => EndpointStyle::Chat,
        }
    }

    /// Reject a model that cannot be served by `style`.
    ///
    /// Runs before any network call; the error is never retried.
    pub fn ensure_supports(&self, style: EndpointStyle) -> Result<(), LlmError> {
        if self.endpoint_style() == style {
            Ok(())
        } else {
            Err(LlmError::InvalidRequest(format!(
                "model '{}' is not served by the {} completion endpoint",
                self, style
            )))
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Model {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LlmError::ModelNotFound(s.to_string()))
    }
}

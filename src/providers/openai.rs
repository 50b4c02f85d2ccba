//! OpenAI HTTP transport.
//!
//! Posts legacy and chat payloads to `{base_url}/completions` and
//! `{base_url}/chat/completions` with bearer auth. Works with any
//! OpenAI-compatible server reachable through `OPENAI_BASE_URL`.

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{LlmError, Result};
use crate::model::EndpointStyle;
use crate::traits::CompletionTransport;
use crate::wire;

const PROVIDER_NAME: &str = "openai";

/// reqwest-backed transport for the OpenAI API.
#[derive(Debug, Clone)]
pub struct OpenAITransport {
    client: Client,
    config: ClientConfig,
}

impl OpenAITransport {
    /// Build a transport with an HTTP client configured from `config`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Self::build_client(&config)?;

        debug!(
            provider = PROVIDER_NAME,
            base_url = %config.base_url,
            timeout = ?config.timeout,
            "Created OpenAI transport"
        );

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn build_client(config: &ClientConfig) -> Result<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key()))
            .map_err(|e| LlmError::ConfigError(format!("Invalid API key: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);

        Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::ConfigError(format!("Failed to build HTTP client: {}", e)))
    }
}

#[async_trait]
impl CompletionTransport for OpenAITransport {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn send(&self, style: EndpointStyle, body: &JsonValue) -> Result<String> {
        let url = self.config.endpoint_url(style.path());
        debug!(url = %url, endpoint = %style, "Sending completion request");

        let response = self.client.post(&url).json(body).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "Completion request failed");
            return Err(wire::parse_error(status.as_u16(), &body));
        }

        debug!(status = status.as_u16(), length = body.len(), "Completion response received");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_creation() {
        let transport = OpenAITransport::new(ClientConfig::new("sk-test")).unwrap();
        assert_eq!(transport.name(), "openai");
        assert_eq!(
            transport.config().endpoint_url(EndpointStyle::Legacy.path()),
            "https://api.openai.com/v1/completions"
        );
    }

    #[test]
    fn test_invalid_key_characters() {
        let result = OpenAITransport::new(ClientConfig::new("sk-bad\nkey"));
        assert!(matches!(result, Err(LlmError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let config = ClientConfig::new("sk-test")
            .with_base_url("http://127.0.0.1:1/v1")
            .with_timeout(std::time::Duration::from_secs(2));
        let transport = OpenAITransport::new(config).unwrap();

        let err = transport
            .send(EndpointStyle::Chat, &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(
            matches!(err, LlmError::NetworkError(_) | LlmError::Timeout),
            "{:?}",
            err
        );
        assert!(err.is_recoverable());
    }
}

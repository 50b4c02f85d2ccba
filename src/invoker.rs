//! Resilient completion invoker.
//!
//! Validates the request against the endpoint style, builds the payload,
//! sends it through a [`CompletionTransport`] under the retry policy, and
//! returns the first choice's text.
//!
//! ```text
//!  CompletionRequest
//!        │ validate_for(style)      ── InvalidRequest, no network call
//!        ▼
//!  wire::build_payload
//!        │
//!        ▼
//!  RetryExecutor::execute ──► transport.send ──► wire::extract_text
//!        ▲                          │ Err
//!        └──── backoff sleep ◄──────┘  (up to max_attempts)
//! ```

use std::sync::Arc;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::model::{EndpointStyle, Model};
use crate::providers::OpenAITransport;
use crate::retry::{BackoffPolicy, RetryExecutor};
use crate::traits::{CompletionRequest, CompletionTransport};
use crate::wire;

/// Issues completions with retry.
///
/// Holds no mutable state; share it across tasks behind an `Arc` or clone it.
#[derive(Clone)]
pub struct CompletionInvoker {
    transport: Arc<dyn CompletionTransport>,
    retry: BackoffPolicy,
    log_retries: bool,
}

impl std::fmt::Debug for CompletionInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionInvoker")
            .field("transport", &self.transport.name())
            .field("retry", &self.retry)
            .finish()
    }
}

impl CompletionInvoker {
    /// Invoker over `transport` with the given retry policy.
    pub fn new(transport: Arc<dyn CompletionTransport>, retry: BackoffPolicy) -> Self {
        Self {
            transport,
            retry,
            log_retries: true,
        }
    }

    /// Invoker over the OpenAI HTTP transport described by `config`.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let retry = config.retry.clone();
        let transport = OpenAITransport::new(config)?;
        Ok(Self::new(Arc::new(transport), retry))
    }

    /// Invoker configured from `OPENAI_API_KEY` and friends.
    pub fn from_env() -> Result<Self> {
        Self::from_config(ClientConfig::from_env()?)
    }

    /// Disable retry logging.
    pub fn silent(mut self) -> Self {
        self.log_retries = false;
        self
    }

    pub fn retry_policy(&self) -> &BackoffPolicy {
        &self.retry
    }

    /// Complete `request` on the endpoint its model is served from.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.invoke(request, request.endpoint_style()).await
    }

    /// Complete `request` on the legacy endpoint.
    ///
    /// Chat-only models are rejected before any network call.
    pub async fn complete_legacy(&self, request: &CompletionRequest) -> Result<String> {
        self.invoke(request, EndpointStyle::Legacy).await
    }

    /// Complete `request` on the chat endpoint as a single user message.
    ///
    /// The legacy-only model is rejected before any network call.
    pub async fn complete_chat(&self, request: &CompletionRequest) -> Result<String> {
        self.invoke(request, EndpointStyle::Chat).await
    }

    async fn invoke(&self, request: &CompletionRequest, style: EndpointStyle) -> Result<String> {
        request.validate_for(style)?;
        let payload = wire::build_payload(request, style)?;

        debug!(
            provider = self.transport.name(),
            model = %request.model,
            endpoint = %style,
            max_attempts = self.retry.attempts(),
            "Invoking completion"
        );

        let executor = if self.log_retries {
            RetryExecutor::new()
        } else {
            RetryExecutor::silent()
        };
        let transport = self.transport.as_ref();
        let payload = &payload;

        executor
            .execute(&self.retry, move || async move {
                let body = transport.send(style, payload).await?;
                wire::extract_text(&body, style)
            })
            .await
    }
}

/// One-shot completion over HTTP.
///
/// `model` defaults to the legacy model; the call shape follows the model.
pub async fn complete(
    config: ClientConfig,
    prompt: impl Into<String>,
    model: Option<Model>,
    temperature: f32,
    max_tokens: u32,
    stop: Option<Vec<String>>,
) -> Result<String> {
    let request = CompletionRequest {
        prompt: prompt.into(),
        model: model.unwrap_or_default(),
        temperature,
        max_tokens,
        stop: stop.filter(|s| !s.is_empty()),
    };
    CompletionInvoker::from_config(config)?
        .complete(&request)
        .await
}

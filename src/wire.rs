//! Provider wire format.
//!
//! Payload construction and response extraction are kept here, away from the
//! retry loop, so a change in the provider's schema touches only this file.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{LlmError, Result};
use crate::model::EndpointStyle;
use crate::traits::{ChatMessage, CompletionRequest};

/// Legacy `/completions` request body.
#[derive(Debug, Serialize)]
struct LegacyRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

/// `/chat/completions` request body.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

#[derive(Debug, Deserialize)]
struct LegacyResponse {
    #[serde(default)]
    choices: Vec<LegacyChoice>,
}

#[derive(Debug, Deserialize)]
struct LegacyChoice {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Error response from API.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Build the JSON body for `request` in the shape `style` expects.
///
/// Legacy sends the raw prompt; chat wraps it in a single user message.
pub fn build_payload(request: &CompletionRequest, style: EndpointStyle) -> Result<JsonValue> {
    let stop = request.stop.as_deref();
    let value = match style {
        EndpointStyle::Legacy => serde_json::to_value(LegacyRequest {
            model: request.model.as_str(),
            prompt: &request.prompt,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            stop,
        })?,
        EndpointStyle::Chat => serde_json::to_value(ChatRequest {
            model: request.model.as_str(),
            messages: vec![ChatMessage::user(request.prompt.as_str())],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stop,
        })?,
    };
    Ok(value)
}

/// Extract the first choice's text from a response body.
///
/// Legacy reads `choices[0].text`, chat reads `choices[0].message.content`.
/// A missing text field yields an empty string; an empty `choices` array is
/// [`LlmError::EmptyResponse`].
pub fn extract_text(body: &str, style: EndpointStyle) -> Result<String> {
    match style {
        EndpointStyle::Legacy => {
            let response: LegacyResponse = serde_json::from_str(body)?;
            let choice = response
                .choices
                .into_iter()
                .next()
                .ok_or(LlmError::EmptyResponse)?;
            Ok(choice.text.unwrap_or_default())
        }
        EndpointStyle::Chat => {
            let response: ChatResponse = serde_json::from_str(body)?;
            let choice = response
                .choices
                .into_iter()
                .next()
                .ok_or(LlmError::EmptyResponse)?;
            Ok(choice
                .message
                .and_then(|m| m.content)
                .unwrap_or_default())
        }
    }
}

/// Map a non-success status and body to an error, preferring the
/// provider's `error.message` over the raw body.
pub fn parse_error(status: u16, body: &str) -> LlmError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.chars().take(500).collect());
    LlmError::from_status(status, message)
}

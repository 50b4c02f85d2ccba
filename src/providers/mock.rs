//! Scripted transport for testing.
//!
//! Replies are consumed in order, one per `send`. When the script runs out,
//! the transport answers with a well-formed "Mock response" body for the
//! requested endpoint style. Every payload it receives is recorded.

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{LlmError, Result};
use crate::model::EndpointStyle;
use crate::traits::CompletionTransport;

/// One scripted outcome.
#[derive(Debug)]
pub enum MockReply {
    /// Raw response body returned as-is.
    Body(String),
    /// Error returned from `send`.
    Error(LlmError),
}

/// Mock transport with queue-based replies.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<Vec<MockReply>>>,
    requests: Arc<Mutex<Vec<(EndpointStyle, JsonValue)>>>,
    call_count: Arc<AtomicUsize>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw response body.
    pub async fn add_body(&self, body: impl Into<String>) {
        self.replies.lock().await.push(MockReply::Body(body.into()));
    }

    /// Queue a legacy response whose first choice has `text`.
    pub async fn add_legacy_text(&self, text: &str) {
        self.add_body(legacy_body(text)).await;
    }

    /// Queue a chat response whose first choice has `content`.
    pub async fn add_chat_content(&self, content: &str) {
        self.add_body(chat_body(content)).await;
    }

    /// Queue an error.
    pub async fn add_error(&self, error: LlmError) {
        self.replies.lock().await.push(MockReply::Error(error));
    }

    /// Queue `n` network errors.
    pub async fn add_failures(&self, n: usize) {
        let mut replies = self.replies.lock().await;
        for i in 0..n {
            replies.push(MockReply::Error(LlmError::NetworkError(format!(
                "simulated failure {}",
                i + 1
            ))));
        }
    }

    /// Number of `send` calls made so far.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Payloads received, in order.
    pub async fn requests(&self) -> Vec<(EndpointStyle, JsonValue)> {
        self.requests.lock().await.clone()
    }

    /// Check if all scripted replies have been consumed.
    pub async fn is_exhausted(&self) -> bool {
        self.replies.lock().await.is_empty()
    }
}

fn legacy_body(text: &str) -> String {
    json!({
        "object": "text_completion",
        "choices": [{ "index": 0, "text": text, "finish_reason": "stop" }],
    })
    .to_string()
}

fn chat_body(content: &str) -> String {
    json!({
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop",
        }],
    })
    .to_string()
}

#[async_trait]
impl CompletionTransport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, style: EndpointStyle, body: &JsonValue) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push((style, body.clone()));

        let mut replies = self.replies.lock().await;
        if replies.is_empty() {
            return Ok(match style {
                EndpointStyle::Legacy => legacy_body("Mock response"),
                EndpointStyle::Chat => chat_body("Mock response"),
            });
        }

        match replies.remove(0) {
            MockReply::Body(body) => Ok(body),
            MockReply::Error(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::extract_text;

    #[tokio::test]
    async fn test_replies_in_order() {
        let transport = MockTransport::new();
        transport.add_failures(1).await;
        transport.add_legacy_text("hello").await;

        let body = json!({});
        assert!(transport.send(EndpointStyle::Legacy, &body).await.is_err());
        let reply = transport.send(EndpointStyle::Legacy, &body).await.unwrap();
        assert_eq!(extract_text(&reply, EndpointStyle::Legacy).unwrap(), "hello");
        assert_eq!(transport.call_count(), 2);
        assert!(transport.is_exhausted().await);
    }

    #[tokio::test]
    async fn test_default_reply_matches_style() {
        let transport = MockTransport::new();
        let reply = transport
            .send(EndpointStyle::Chat, &json!({"model": "gpt-4"}))
            .await
            .unwrap();
        assert_eq!(
            extract_text(&reply, EndpointStyle::Chat).unwrap(),
            "Mock response"
        );

        let requests = transport.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, EndpointStyle::Chat);
        assert_eq!(requests[0].1["model"], "gpt-4");
    }
}

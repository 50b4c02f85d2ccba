//! Resilient LLM completions.
//!
//! Sends a prompt to a legacy text-completion or chat-completion endpoint
//! and retries failures with randomized exponential backoff.
//!
//! # Models
//!
//! | Model | Endpoint | Payload |
//! |-------|----------|---------|
//! | `text-davinci-003` | `/completions` | raw prompt |
//! | `gpt-3.5-turbo` | `/chat/completions` | single user message |
//! | `gpt-4` | `/chat/completions` | single user message |
//!
//! # Retry policy
//!
//! Up to 6 attempts. Waits start at 1s, double per retry, are capped at 60s
//! and jittered without ever decreasing. The error of the final attempt is
//! returned unchanged. See [`retry`].
//!
//! # Example
//!
//! ```ignore
//! use resilient_llm::{CompletionInvoker, CompletionRequest, Model};
//!
//! let invoker = CompletionInvoker::from_env()?;
//! let request = CompletionRequest::new("Hello, world!").with_model(Model::Gpt4);
//! let text = invoker.complete(&request).await?;
//! ```

pub mod config;
pub mod error;
pub mod invoker;
pub mod model;
pub mod providers;
pub mod retry;
pub mod traits;
pub mod wire;

pub use config::ClientConfig;
pub use error::{LlmError, Result};
pub use invoker::{complete, CompletionInvoker};
pub use model::{EndpointStyle, Model};
pub use providers::mock::MockTransport;
pub use providers::openai::OpenAITransport;
pub use retry::{retry_with_backoff, BackoffPolicy, RetryExecutor, RetryOn};
pub use traits::{ChatMessage, ChatRole, CompletionRequest, CompletionTransport};

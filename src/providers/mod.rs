//! Completion transports.

pub mod openai;
pub use openai::OpenAITransport;

pub mod mock;
pub use mock::{MockReply, MockTransport};

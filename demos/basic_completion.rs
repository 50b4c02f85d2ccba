//! Basic completion example
//!
//! Run with: cargo run --example basic_completion -- [model] [prompt]
//! Requires: OPENAI_API_KEY environment variable
//!
//! Set RUST_LOG=resilient_llm=debug to watch the retry loop.

use resilient_llm::{CompletionInvoker, CompletionRequest, Model};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let model: Model = args.next().as_deref().unwrap_or("gpt-3.5-turbo").parse()?;
    let prompt = args
        .next()
        .unwrap_or_else(|| "What is the capital of France? Answer in one word.".to_string());

    let invoker = CompletionInvoker::from_env()?;
    let request = CompletionRequest::new(prompt).with_model(model);

    println!("Sending {} request with {}...", request.endpoint_style(), model);
    let text = invoker.complete(&request).await?;
    println!("\nResponse: {}", text.trim());

    Ok(())
}

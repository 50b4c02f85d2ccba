//! Retry handling example
//!
//! Run with: cargo run --example retry_handling
//!
//! Uses the scripted mock transport, so no API key or network is needed.
//! Shows the backoff schedule, recovery after transient failures, and the
//! final error surfacing once the attempt cap is reached.

use rand::rngs::StdRng;
use rand::SeedableRng;
use resilient_llm::{
    BackoffPolicy, CompletionInvoker, CompletionRequest, LlmError, MockTransport, Model,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("resilient_llm=debug")
        .init();

    show_schedule();

    // Short waits so the demo finishes quickly; same shape as the default.
    let policy = BackoffPolicy::new(6, Duration::from_millis(50), Duration::from_secs(3))
        .with_base(Duration::from_millis(50));

    recover_after_failures(&policy).await?;
    give_up_after_cap(&policy).await;

    Ok(())
}

fn show_schedule() {
    let policy = BackoffPolicy::default();
    println!("Default policy: {} attempts", policy.max_attempts);
    for (retry, wait) in policy.waits(StdRng::seed_from_u64(7)).take(5).enumerate() {
        println!(
            "  retry {}: wait {:>6.2}s (ceiling {}s)",
            retry + 1,
            wait.as_secs_f64(),
            policy.ceiling(retry as u32 + 1).as_secs()
        );
    }
}

async fn recover_after_failures(policy: &BackoffPolicy) -> Result<(), LlmError> {
    let transport = MockTransport::new();
    transport.add_failures(2).await;
    transport
        .add_error(LlmError::RateLimited("slow down".to_string()))
        .await;
    transport.add_chat_content("Paris").await;

    let invoker = CompletionInvoker::new(Arc::new(transport.clone()), policy.clone());
    let request = CompletionRequest::new("Capital of France?").with_model(Model::Gpt4);
    let text = invoker.complete(&request).await?;

    println!("\nRecovered: '{}' after {} attempts", text, transport.call_count());
    Ok(())
}

async fn give_up_after_cap(policy: &BackoffPolicy) {
    let transport = MockTransport::new();
    transport.add_failures(policy.max_attempts as usize).await;

    let invoker = CompletionInvoker::new(Arc::new(transport.clone()), policy.clone());
    match invoker.complete(&CompletionRequest::new("Hello")).await {
        Ok(text) => println!("\nUnexpected success: {}", text),
        Err(e) => println!(
            "\nGave up after {} attempts: {} ({})",
            transport.call_count(),
            e,
            e.user_description()
        ),
    }
}

//! Failed calls are returned to the caller, never reported through the log.

use resilient_llm::{BackoffPolicy, ClientConfig, CompletionInvoker, CompletionRequest, LlmError};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

#[tokio::test]
async fn test_silent_invoker_logs_nothing_at_warn_on_network_failure() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("resilient_llm=warn"))
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let policy = BackoffPolicy::new(3, Duration::from_millis(1), Duration::from_millis(5))
        .with_base(Duration::from_millis(1));
    let config = ClientConfig::new("sk-test")
        .with_base_url("http://127.0.0.1:1/v1")
        .with_timeout(Duration::from_secs(2))
        .with_retry(policy);
    let invoker = CompletionInvoker::from_config(config).unwrap().silent();

    let err = invoker
        .complete(&CompletionRequest::new("Hi"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, LlmError::NetworkError(_) | LlmError::Timeout),
        "{:?}",
        err
    );

    let captured = logs.contents();
    assert!(captured.is_empty(), "unexpected log output: {}", captured);
}

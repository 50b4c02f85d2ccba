//! OpenAI transport against a local scripted HTTP server.
//!
//! Each connection gets one scripted `(status, body)` reply and is closed,
//! so retries open fresh connections. Requests are captured for assertions.

use resilient_llm::{
    BackoffPolicy, ClientConfig, CompletionInvoker, CompletionRequest, LlmError, Model, RetryOn,
};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// Raw HTTP request as received by the server.
struct Captured {
    head: String,
    body: serde_json::Value,
}

async fn read_request(socket: &mut TcpStream) -> Captured {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.expect("read");
        assert!(n > 0, "client closed before sending headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.expect("read body");
        assert!(n > 0, "client closed mid-body");
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = serde_json::from_slice(&buf[header_end..header_end + content_length])
        .unwrap_or(serde_json::Value::Null);
    Captured { head, body }
}

/// Serve `replies` in order; returns the base URL and a channel of captured requests.
async fn serve(replies: Vec<(u16, String)>) -> (String, mpsc::UnboundedReceiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        for (status, body) in replies {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let captured = read_request(&mut socket).await;
            let _ = tx.send(captured);

            let response = format!(
                "HTTP/1.1 {} Scripted\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.expect("write");
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{}/v1", addr), rx)
}

fn fast_policy() -> BackoffPolicy {
    BackoffPolicy::new(6, Duration::from_millis(1), Duration::from_millis(20))
        .with_base(Duration::from_millis(1))
}

fn invoker(base_url: &str, policy: BackoffPolicy) -> CompletionInvoker {
    let config = ClientConfig::new("sk-local-test")
        .with_base_url(base_url)
        .with_timeout(Duration::from_secs(5))
        .with_retry(policy);
    CompletionInvoker::from_config(config).expect("invoker").silent()
}

#[tokio::test]
async fn test_legacy_completion_over_http() {
    let (base_url, mut rx) = serve(vec![(
        200,
        r#"{"choices":[{"text":"hello","index":0}]}"#.to_string(),
    )])
    .await;

    let text = invoker(&base_url, fast_policy())
        .complete(&CompletionRequest::new("Say hello").with_stop(["\n"]))
        .await
        .unwrap();
    assert_eq!(text, "hello");

    let captured = rx.recv().await.unwrap();
    assert!(captured.head.starts_with("POST /v1/completions "));
    assert!(captured
        .head
        .to_ascii_lowercase()
        .contains("authorization: bearer sk-local-test"));
    assert_eq!(captured.body["model"], "text-davinci-003");
    assert_eq!(captured.body["prompt"], "Say hello");
    assert_eq!(captured.body["stop"][0], "\n");
}

#[tokio::test]
async fn test_chat_completion_over_http() {
    let (base_url, mut rx) = serve(vec![(
        200,
        r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"hi"}}]}"#.to_string(),
    )])
    .await;

    let request = CompletionRequest::new("Say hi").with_model(Model::Gpt4);
    let text = invoker(&base_url, fast_policy())
        .complete(&request)
        .await
        .unwrap();
    assert_eq!(text, "hi");

    let captured = rx.recv().await.unwrap();
    assert!(captured.head.starts_with("POST /v1/chat/completions "));
    assert_eq!(captured.body["messages"][0]["role"], "user");
    assert_eq!(captured.body["messages"][0]["content"], "Say hi");
}

#[tokio::test]
async fn test_rate_limit_then_success_over_http() {
    let (base_url, mut rx) = serve(vec![
        (
            429,
            r#"{"error":{"message":"Rate limit reached"}}"#.to_string(),
        ),
        (503, "Service Unavailable".to_string()),
        (
            200,
            r#"{"choices":[{"message":{"content":"third time"}}]}"#.to_string(),
        ),
    ])
    .await;

    let request = CompletionRequest::new("Hi").with_model(Model::Gpt35Turbo);
    let text = invoker(&base_url, fast_policy())
        .complete(&request)
        .await
        .unwrap();
    assert_eq!(text, "third time");

    for _ in 0..3 {
        assert!(rx.recv().await.is_some());
    }
}

#[tokio::test]
async fn test_exhaustion_over_http_surfaces_last_status() {
    let mut replies: Vec<(u16, String)> = (0..5)
        .map(|_| (500, r#"{"error":{"message":"boom"}}"#.to_string()))
        .collect();
    replies.push((
        429,
        r#"{"error":{"message":"still limited"}}"#.to_string(),
    ));
    let (base_url, mut rx) = serve(replies).await;

    let err = invoker(&base_url, fast_policy())
        .complete(&CompletionRequest::new("Hi"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, LlmError::RateLimited(ref m) if m == "still limited"),
        "{:?}",
        err
    );

    let mut seen = 0;
    while rx.recv().await.is_some() {
        seen += 1;
    }
    assert_eq!(seen, 6);
}

#[tokio::test]
async fn test_auth_error_with_transient_only_policy() {
    let (base_url, mut rx) = serve(vec![(
        401,
        r#"{"error":{"message":"Incorrect API key provided"}}"#.to_string(),
    )])
    .await;

    let policy = fast_policy().with_retry_on(RetryOn::Transient);
    let err = invoker(&base_url, policy)
        .complete(&CompletionRequest::new("Hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::AuthError(_)));

    assert!(rx.recv().await.is_some());
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_free_complete_function_defaults_to_legacy() {
    let (base_url, mut rx) = serve(vec![(
        200,
        r#"{"choices":[{"text":" world"}]}"#.to_string(),
    )])
    .await;

    let config = ClientConfig::new("sk-local-test")
        .with_base_url(base_url)
        .with_retry(fast_policy());
    let text = resilient_llm::complete(config, "hello", None, 0.0, 256, Some(vec![]))
        .await
        .unwrap();
    assert_eq!(text, " world");

    let captured = rx.recv().await.unwrap();
    assert!(captured.head.starts_with("POST /v1/completions "));
    assert_eq!(captured.body["max_tokens"], 256);
    assert!(captured.body.get("stop").is_none());
}

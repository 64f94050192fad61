//! Exercises the OpenAI-compatible provider against a local axum server
//! standing in for the hosted endpoint.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use askbot::config::ModelConfig;
use askbot::llm::providers::openai_compatible::OpenAiCompatibleProvider;
use askbot::llm::{ChatMessage, ProviderError, Role};

/// Replies served in order; the last one repeats.
#[derive(Clone)]
struct Mock {
    replies: Arc<Vec<(StatusCode, Value)>>,
    seen: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
}

async fn completions(
    State(mock): State<Mock>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut seen = mock.seen.lock().unwrap();
    seen.push((headers, body));
    let idx = (seen.len() - 1).min(mock.replies.len() - 1);
    let (status, reply) = mock.replies[idx].clone();
    (status, Json(reply))
}

async fn serve(replies: Vec<(StatusCode, Value)>) -> (String, Mock) {
    let mock = Mock {
        replies: Arc::new(replies),
        seen: Arc::default(),
    };
    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(mock.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/v1/chat/completions"), mock)
}

fn provider(url: String, max_retries: u32) -> OpenAiCompatibleProvider {
    let config = ModelConfig {
        api_base_url: url,
        timeout_seconds: Some(5),
        max_retries,
        ..ModelConfig::default()
    };
    OpenAiCompatibleProvider::new(config, Some("test-key".into()))
        .unwrap()
        .with_backoff(Duration::from_millis(1))
}

fn ok_reply(text: &str) -> (StatusCode, Value) {
    (
        StatusCode::OK,
        json!({
            "choices": [{ "message": { "role": "assistant", "content": text } }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 1 }
        }),
    )
}

fn question() -> Vec<ChatMessage> {
    vec![
        ChatMessage::new(Role::System, "you are a chat bot"),
        ChatMessage::new(Role::User, "question:What is 2+2?"),
    ]
}

#[tokio::test]
async fn sends_configured_request_and_extracts_first_choice() {
    let (url, mock) = serve(vec![ok_reply(" 4\n")]).await;
    let reply = provider(url, 2).complete(&question()).await.unwrap();

    assert_eq!(reply.text, " 4\n");
    assert_eq!(reply.usage.unwrap().input_tokens, 12);

    let seen = mock.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (headers, body) = &seen[0];
    assert_eq!(headers["authorization"], "Bearer test-key");
    assert_eq!(body["model"], "gemini-2.0-flash");
    assert_eq!(body["temperature"], 0.0);
    assert_eq!(body["max_tokens"], 500);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "you are a chat bot");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "question:What is 2+2?");
}

#[tokio::test]
async fn content_is_returned_verbatim() {
    let (url, _mock) = serve(vec![ok_reply("    indented code\n")]).await;
    let reply = provider(url, 0).complete(&question()).await.unwrap();
    assert_eq!(reply.text, "    indented code\n");
}

#[tokio::test]
async fn empty_content_is_an_answer() {
    let (url, mock) = serve(vec![ok_reply("")]).await;
    let reply = provider(url, 2).complete(&question()).await.unwrap();
    assert_eq!(reply.text, "");
    assert_eq!(mock.seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn null_content_is_malformed() {
    let (url, _mock) = serve(vec![(
        StatusCode::OK,
        json!({ "choices": [{ "message": { "role": "assistant", "content": null } }] }),
    )])
    .await;

    let err = provider(url, 2).complete(&question()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Malformed(_)), "got {err:?}");
}

#[tokio::test]
async fn temperature_sent_for_every_model() {
    let (url, mock) = serve(vec![ok_reply("4")]).await;
    let config = ModelConfig {
        api_base_url: url,
        model: "gpt-5-mini".into(),
        temperature: 0.7,
        timeout_seconds: Some(5),
        ..ModelConfig::default()
    };
    OpenAiCompatibleProvider::new(config, None)
        .unwrap()
        .complete(&question())
        .await
        .unwrap();

    let seen = mock.seen.lock().unwrap();
    let (headers, body) = &seen[0];
    assert!(headers.get("authorization").is_none());
    assert_eq!(body["model"], "gpt-5-mini");
    assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
}

#[tokio::test]
async fn retries_server_errors_then_succeeds() {
    let (url, mock) = serve(vec![
        (StatusCode::SERVICE_UNAVAILABLE, json!({ "error": { "message": "overloaded" } })),
        (StatusCode::TOO_MANY_REQUESTS, json!({ "error": { "message": "slow down" } })),
        ok_reply("4"),
    ])
    .await;

    let reply = provider(url, 2).complete(&question()).await.unwrap();
    assert_eq!(reply.text, "4");
    assert_eq!(mock.seen.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn gives_up_after_max_retries() {
    let (url, mock) = serve(vec![(
        StatusCode::TOO_MANY_REQUESTS,
        json!([{ "error": { "code": 429, "message": "quota exceeded" } }]),
    )])
    .await;

    let err = provider(url, 2).complete(&question()).await.unwrap_err();
    assert_eq!(err, ProviderError::RateLimited("quota exceeded [code=429]".into()));
    assert_eq!(mock.seen.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let (url, mock) = serve(vec![(
        StatusCode::UNAUTHORIZED,
        json!({ "error": { "message": "API key not valid" } }),
    )])
    .await;

    let err = provider(url, 2).complete(&question()).await.unwrap_err();
    assert_eq!(
        err,
        ProviderError::Http { status: 401, message: "API key not valid".into() }
    );
    assert_eq!(mock.seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn empty_choices_are_malformed() {
    let (url, mock) = serve(vec![(StatusCode::OK, json!({ "choices": [] }))]).await;

    let err = provider(url, 2).complete(&question()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Malformed(_)));
    assert_eq!(mock.seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = provider(format!("http://{addr}/v1/chat/completions"), 1)
        .complete(&question())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn slow_endpoint_times_out_after_every_attempt() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route(
            "/v1/chat/completions",
            post(|State(attempts): State<Arc<AtomicUsize>>| async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!({ "choices": [] }))
            }),
        )
        .with_state(attempts.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = ModelConfig {
        api_base_url: format!("http://{addr}/v1/chat/completions"),
        timeout_seconds: Some(1),
        max_retries: 1,
        ..ModelConfig::default()
    };
    let provider = OpenAiCompatibleProvider::new(config, Some("test-key".into()))
        .unwrap()
        .with_backoff(Duration::from_millis(1));

    let err = provider.complete(&question()).await.unwrap_err();
    assert_eq!(err, ProviderError::Timeout);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn ping_succeeds_on_any_http_response() {
    // HEAD on a POST-only route answers 405, which still proves reachability.
    let (url, mock) = serve(vec![ok_reply("unused")]).await;
    provider(url, 0).ping().await.unwrap();
    assert!(mock.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn ping_fails_when_nothing_listens() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = provider(format!("http://{addr}/v1/chat/completions"), 0)
        .ping()
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Transport(_)), "got {err:?}");
}

//! Drives the web channel router in-process with a scripted provider.

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use askbot::comms::AskState;
use askbot::comms::web::build_router;
use askbot::llm::providers::scripted::ScriptedProvider;
use askbot::llm::{LlmProvider, ProviderError, Role};
use askbot::pipeline::Pipeline;
use askbot::prompt::ChatPromptTemplate;

const TITLE: &str = "This is a chatbot";

fn router(mock: &ScriptedProvider) -> axum::Router {
    let state = AskState::new(
        TITLE,
        "enter your question here",
        Pipeline::new(
            ChatPromptTemplate::default_question(),
            LlmProvider::Scripted(mock.clone()),
        ),
    );
    build_router(Arc::new(state))
}

async fn body_string(resp: axum::response::Response) -> String {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn empty_page_shows_title_and_input_only() {
    let mock = ScriptedProvider::replying("never");
    let resp = router(&mock)
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains(TITLE));
    assert!(html.contains("enter your question here"));
    assert!(!html.contains(r#"id="answer""#));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn query_question_is_answered() {
    let mock = ScriptedProvider::replying("4");
    let resp = router(&mock)
        .oneshot(
            Request::get("/?question=What%20is%202%2B2%3F")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains(r#"<div class="answer" id="answer">4</div>"#));

    let calls = mock.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0][0].role, Role::System);
    assert_eq!(calls[0][0].content, "you are a chat bot");
    assert_eq!(calls[0][1].content, "question:What is 2+2?");
}

#[tokio::test]
async fn form_post_is_answered() {
    let mock = ScriptedProvider::replying("Paris");
    let resp = router(&mock)
        .oneshot(
            Request::post("/")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("question=Capital+of+France%3F"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("Paris"));
    assert_eq!(mock.calls()[0][1].content, "question:Capital of France?");
}

#[tokio::test]
async fn timeout_renders_error_page() {
    let mock = ScriptedProvider::failing(ProviderError::Timeout);
    let app = router(&mock);

    let resp = app
        .clone()
        .oneshot(Request::get("/?question=slow").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    let html = body_string(resp).await;
    assert!(html.contains(r#"id="error""#));
    assert!(html.contains(TITLE));

    // Still serving after the failure.
    let resp = app
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn remote_failure_page_omits_upstream_body() {
    let mock = ScriptedProvider::failing(ProviderError::Http {
        status: 400,
        message: "API key not valid. key=AIza-leaked".into(),
    });
    let resp = router(&mock)
        .oneshot(Request::get("/?question=hi").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let html = body_string(resp).await;
    assert!(html.contains("Something went wrong"));
    assert!(!html.contains("AIza-leaked"));
}

#[tokio::test]
async fn api_ask_returns_answer() {
    let mock = ScriptedProvider::replying("4");
    let resp = router(&mock)
        .oneshot(
            Request::post("/api/ask")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"question":"What is 2+2?"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let v: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(v["answer"], "4");
}

#[tokio::test]
async fn api_ask_empty_question_makes_no_call() {
    let mock = ScriptedProvider::replying("never");
    let resp = router(&mock)
        .oneshot(
            Request::post("/api/ask")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"question":""}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let v: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert!(v["answer"].is_null());
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn api_ask_remote_failure_is_bad_gateway() {
    let mock = ScriptedProvider::failing(ProviderError::Http {
        status: 401,
        message: "API key not valid".into(),
    });
    let resp = router(&mock)
        .oneshot(
            Request::post("/api/ask")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"question":"hi"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let v: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(v["error"], "remote");
    assert!(v["message"].as_str().unwrap().contains("API key not valid"));
}

#[tokio::test]
async fn health_reports_provider() {
    let mock = ScriptedProvider::replying("x");
    let resp = router(&mock)
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let v: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(v["status"], "ok");
    assert_eq!(v["provider"], "scripted");
}

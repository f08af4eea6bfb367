//! Integration tests for the HTTP backend
//!
//! Runs LmStudioClient against a local axum server speaking /chat/completions

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

use lmswitch::config::{EndpointConfig, SwitchConfig};
use lmswitch::core::{ChatBackend, LmStudioClient, NoTools, TurnController};
use lmswitch::error::ChatError;
use lmswitch::types::{ChatMessage, ChatRequest, Conversation, ToolDefinition, TurnPhase};

/// Requests the mock received: (authorization header, body)
type Captured = Arc<Mutex<Vec<(String, Value)>>>;

#[derive(Clone)]
struct Mock {
    captured: Captured,
    status: StatusCode,
    response: Value,
}

async fn completions(State(mock): State<Mock>, headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    mock.captured.lock().unwrap().push((auth, body));
    (mock.status, Json(mock.response.clone()))
}

/// Serve one canned response; returns the base URL and the capture log
async fn spawn_mock(status: StatusCode, response: Value) -> (String, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let mock = Mock {
        captured: Arc::clone(&captured),
        status,
        response,
    };
    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/v1/", addr), captured)
}

fn client(base_url: &str) -> LmStudioClient {
    LmStudioClient::new(&EndpointConfig {
        base_url: base_url.to_string(),
        api_key: "lm-studio".to_string(),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn test_text_reply_round_trip() {
    let (base, captured) = spawn_mock(
        StatusCode::OK,
        json!({"choices": [{"index": 0, "message": {"role": "assistant", "content": "Hi!"}}]}),
    )
    .await;
    let client = client(&base);
    let messages = vec![ChatMessage::system("sys"), ChatMessage::user("hello")];

    let reply = client
        .complete(&ChatRequest {
            model: "qwen3-8b",
            messages: &messages,
            tools: None,
        })
        .await
        .unwrap();

    assert_eq!(reply.content.as_deref(), Some("Hi!"));
    assert!(!reply.has_tool_calls());

    let seen = captured.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (auth, body) = &seen[0];
    assert_eq!(auth, "Bearer lm-studio");
    assert_eq!(body["model"], "qwen3-8b");
    assert_eq!(body["messages"][1], json!({"role": "user", "content": "hello"}));
    assert!(body.get("tools").is_none());
}

#[tokio::test]
async fn test_tool_calls_and_declarations() {
    let (base, captured) = spawn_mock(
        StatusCode::OK,
        json!({"choices": [{"message": {
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_9",
                "type": "function",
                "function": {"name": "roll_d6", "arguments": "{}"}
            }]
        }}]}),
    )
    .await;
    let client = client(&base);
    let messages = vec![ChatMessage::user("roll")];
    let tools = vec![ToolDefinition::no_args("roll_d6", "Roll a six-sided die")];

    let reply = client
        .complete(&ChatRequest {
            model: "qwen/qwen3-8b",
            messages: &messages,
            tools: Some(&tools),
        })
        .await
        .unwrap();

    let calls = reply.tool_calls.unwrap();
    assert_eq!(calls[0].id, "call_9");
    assert_eq!(calls[0].function.name, "roll_d6");

    let seen = captured.lock().unwrap();
    let body = &seen[0].1;
    assert_eq!(body["tools"][0]["type"], "function");
    assert_eq!(body["tools"][0]["function"]["name"], "roll_d6");
}

#[tokio::test]
async fn test_error_status_is_surfaced() {
    let (base, _) = spawn_mock(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": "model not loaded"}),
    )
    .await;
    let client = client(&base);
    let messages = vec![ChatMessage::user("hello")];

    let err = client
        .complete(&ChatRequest {
            model: "missing",
            messages: &messages,
            tools: None,
        })
        .await
        .unwrap_err();

    match err {
        ChatError::Status { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("model not loaded"));
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_no_choices_is_an_error() {
    let (base, _) = spawn_mock(StatusCode::OK, json!({"choices": []})).await;
    let client = client(&base);
    let messages = vec![ChatMessage::user("hello")];

    let err = client
        .complete(&ChatRequest {
            model: "m",
            messages: &messages,
            tools: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ChatError::EmptyChoices));
}

/// A failing endpoint aborts the turn without touching the history beyond the user line
#[tokio::test]
async fn test_controller_aborts_on_http_error() {
    let (base, _) = spawn_mock(StatusCode::SERVICE_UNAVAILABLE, json!({})).await;
    let client = client(&base);
    let mut controller = TurnController::new(SwitchConfig::default());
    let mut conv = Conversation::with_system("sys");

    let out = controller.run_turn(&client, &mut NoTools, &mut conv, "anyone there?").await;

    assert_eq!(out.phase, TurnPhase::Aborted);
    assert!(out.error.unwrap().contains("503"));
    assert_eq!(conv.len(), 2);
}

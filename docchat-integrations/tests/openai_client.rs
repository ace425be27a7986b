//! OpenAI-compatible client against a local mock endpoint.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use docchat_core::{
    ChatLlm, ChatMessage, LlmStreamUnit, ToolCall, ToolDefinition, config::LlmConfig,
};
use docchat_integrations::OpenAiChatClient;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct MockState {
    requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    fail_with: Option<StatusCode>,
}

const STREAM_BODY: &str = concat!(
    "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\",\"content\":\"Let me \"}}]}\n\n",
    "data: {\"choices\":[{\"delta\":{\"content\":\"check.\"}}]}\n\n",
    "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_1\",\"type\":\"function\",",
    "\"function\":{\"name\":\"query_document\",\"arguments\":\"{\\\"query\\\":\"}}]}}]}\n\n",
    "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"\\\"letter size\\\"}\"}}]}}]}\n\n",
    "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"tool_calls\"}]}\n\n",
    "data: [DONE]\n\n",
);

async fn completions(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let streaming = body["stream"].as_bool().unwrap_or(false);
    state.requests.lock().unwrap().push((auth, body));

    if let Some(status) = state.fail_with {
        return (
            status,
            Json(json!({"error": {"message": "invalid api key"}})),
        )
            .into_response();
    }

    if streaming {
        ([(header::CONTENT_TYPE, "text/event-stream")], STREAM_BODY).into_response()
    } else {
        Json(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "1. Why?\n2. How?"}}]
        }))
        .into_response()
    }
}

async fn spawn_mock(state: MockState) -> String {
    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/v1/")
}

fn client(base_url: &str) -> OpenAiChatClient {
    OpenAiChatClient::new(
        LlmConfig::new("gpt-4o-mini")
            .with_api_key("sk-test")
            .with_base_url(base_url),
    )
    .unwrap()
}

fn query_tool() -> ToolDefinition {
    ToolDefinition {
        name: "query_document".into(),
        description: "Search the documents".into(),
        parameters: json!({
            "type": "object",
            "properties": {"query": {"type": "string"}},
            "required": ["query"]
        }),
    }
}

#[tokio::test]
async fn test_chat_stream_yields_text_then_tool_calls() {
    let state = MockState::default();
    let base_url = spawn_mock(state.clone()).await;
    let client = client(&base_url);

    let stream = client
        .chat_stream(&[ChatMessage::user("How big can a letter be?")], &[query_tool()])
        .await
        .unwrap();
    let units: Vec<_> = stream.map(|unit| unit.unwrap()).collect().await;

    assert_eq!(
        units,
        vec![
            LlmStreamUnit::TextDelta("Let me ".into()),
            LlmStreamUnit::TextDelta("check.".into()),
            LlmStreamUnit::ToolCall(ToolCall::new(
                "call_1",
                "query_document",
                json!({"query": "letter size"})
            )),
        ]
    );

    let requests = state.requests.lock().unwrap();
    let (auth, body) = &requests[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(body["model"], json!("gpt-4o-mini"));
    assert_eq!(body["stream"], json!(true));
    assert_eq!(body["tools"][0]["function"]["name"], json!("query_document"));
    assert_eq!(
        body["messages"][0],
        json!({"role": "user", "content": "How big can a letter be?"})
    );
}

#[tokio::test]
async fn test_generate_text() {
    let state = MockState::default();
    let base_url = spawn_mock(state.clone()).await;

    let text = client(&base_url).generate_text("Suggest questions").await.unwrap();
    assert_eq!(text, "1. Why?\n2. How?");

    let requests = state.requests.lock().unwrap();
    assert_eq!(requests[0].1["stream"], json!(false));
    assert!(requests[0].1.get("tools").is_none());
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let state = MockState {
        fail_with: Some(StatusCode::UNAUTHORIZED),
        ..MockState::default()
    };
    let base_url = spawn_mock(state).await;

    let err = client(&base_url)
        .chat_stream(&[ChatMessage::user("hi")], &[])
        .await
        .err()
        .unwrap();
    let message = err.to_string();
    assert!(message.contains("Authentication failed"), "{message}");
    assert!(message.contains("invalid api key"), "{message}");
}

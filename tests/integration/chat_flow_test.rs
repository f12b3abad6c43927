use agentloom_core::{
    ApiClient, ChatRenderer, ChatSession, Source, TurnState, CONNECTION_ERROR_MESSAGE,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct Transcript {
    statuses: Vec<String>,
    removed: usize,
    responses: Vec<(String, Vec<Source>)>,
    errors: Vec<String>,
}

impl ChatRenderer for Transcript {
    fn show_thinking(&mut self) {}

    fn update_thinking(&mut self, status: &str) {
        self.statuses.push(status.to_string());
    }

    fn remove_thinking(&mut self) {
        self.removed += 1;
    }

    fn render_response(&mut self, content: &str, sources: &[Source]) {
        self.responses.push((content.to_string(), sources.to_vec()));
    }

    fn render_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

fn sse(frames: &[serde_json::Value]) -> String {
    frames
        .iter()
        .map(|f| format!("data: {}\n\n", f))
        .collect()
}

async fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(server.uri())
        .with_token("test-token")
        .with_timezone("Europe/Berlin")
}

#[tokio::test]
async fn test_streamed_answer_with_sources() {
    let server = MockServer::start().await;
    let body = sse(&[
        json!({"type": "conversation_id", "content": "conv-42"}),
        json!({"type": "thinking", "content": "Looking it up"}),
        json!({"type": "tool_call", "content": {"tool": "handbook"}}),
        json!({"type": "content", "content": "You get "}),
        json!({"type": "content", "content": "25 days."}),
        json!({"type": "sources", "content": [{"title": "Handbook", "url": "https://intra/hb"}]}),
        json!({"type": "done"}),
    ]);

    Mock::given(method("POST"))
        .and(path("/api/agents/agent-1/chat/stream"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(json!({
            "message": "How much leave?",
            "conversation_id": null,
            "timezone": "Europe/Berlin"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let mut session = ChatSession::new("agent-1");
    let mut out = Transcript::default();

    let outcome = session.send(&client, "How much leave?", &mut out).await;

    assert!(outcome.is_success());
    assert_eq!(session.conversation_id(), Some("conv-42"));
    assert_eq!(out.statuses, vec!["Looking it up", "Using handbook..."]);
    assert_eq!(out.removed, 1);
    assert_eq!(out.responses.len(), 1);
    assert_eq!(out.responses[0].0, "You get 25 days.");
    assert_eq!(out.responses[0].1[0].title, "Handbook");
    assert!(out.errors.is_empty());
}

#[tokio::test]
async fn test_follow_up_reuses_conversation_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/agents/agent-1/chat/stream"))
        .and(body_partial_json(json!({"conversation_id": "conv-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sse(&[
                json!({"type": "content", "content": "again"}),
                json!({"type": "done"}),
            ]),
            "text/event-stream",
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/agents/agent-1/chat/stream"))
        .and(body_partial_json(json!({"conversation_id": null})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sse(&[
                json!({"type": "conversation_id", "content": "conv-1"}),
                json!({"type": "content", "content": "first"}),
                json!({"type": "done"}),
            ]),
            "text/event-stream",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let mut session = ChatSession::new("agent-1");
    let mut out = Transcript::default();

    assert!(session.send(&client, "one", &mut out).await.is_success());
    assert!(session.send(&client, "two", &mut out).await.is_success());
    assert_eq!(
        out.responses.iter().map(|r| r.0.as_str()).collect::<Vec<_>>(),
        vec!["first", "again"]
    );
}

#[tokio::test]
async fn test_server_error_frame_is_shown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/agents/agent-1/test-chat/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "data: {\"type\":\"error\",\"content\":\"Model quota exceeded\"}\n",
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let mut session = ChatSession::for_testing("agent-1");
    let mut out = Transcript::default();

    let outcome = session.send(&client, "hi", &mut out).await;

    assert_eq!(outcome.state, TurnState::Error);
    assert_eq!(out.errors, vec!["Model quota exceeded"]);
    assert_eq!(out.removed, 1);
}

#[tokio::test]
async fn test_http_failure_becomes_connection_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/agents/agent-1/chat/stream"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"detail": "Agent crashed"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let mut session = ChatSession::new("agent-1");
    let mut out = Transcript::default();

    let outcome = session.send(&client, "hi", &mut out).await;

    assert_eq!(outcome.state, TurnState::Error);
    assert_eq!(out.errors, vec![CONNECTION_ERROR_MESSAGE]);
    assert_eq!(out.removed, 1);
    assert!(session.conversation_id().is_none());
}

#[tokio::test]
async fn test_malformed_frames_are_skipped() {
    let server = MockServer::start().await;
    let body = "data: {\"type\":\"content\",\"content\":\"ok\"}\n\
                data: {broken\n\
                : comment line\n\
                data: {\"type\":\"done\"}\n";
    Mock::given(method("POST"))
        .and(path("/api/agents/agent-1/chat/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let mut session = ChatSession::new("agent-1");
    let mut out = Transcript::default();

    let outcome = session.send(&client, "hi", &mut out).await;

    assert!(outcome.is_success());
    assert_eq!(out.responses[0].0, "ok");
}

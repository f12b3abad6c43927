use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::time::Duration;
use tracing::{debug, info};

use super::decoder::SseDecoder;
use super::turn::{ChatRenderer, ChatTurn, TurnOutcome};
use crate::error::{AgentloomError, AgentloomResult};
use crate::http::ApiClient;
use crate::models::ChatRequest;

pub type ByteStream = BoxStream<'static, AgentloomResult<Vec<u8>>>;

/// Anything that can open a chat stream and hand back its body as raw chunks.
#[async_trait]
pub trait ChatStreamSource: Send + Sync {
    async fn open_chat_stream(
        &self,
        path: &str,
        request: &ChatRequest<'_>,
    ) -> AgentloomResult<ByteStream>;

    fn timezone(&self) -> &str {
        "UTC"
    }

    fn idle_timeout(&self) -> Option<Duration> {
        None
    }
}

#[async_trait]
impl ChatStreamSource for ApiClient {
    async fn open_chat_stream(
        &self,
        path: &str,
        request: &ChatRequest<'_>,
    ) -> AgentloomResult<ByteStream> {
        let response = self.open_stream(path, request).await?;
        let stream = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| AgentloomError::StreamInterrupted(e.to_string()))
        });
        Ok(stream.boxed())
    }

    fn timezone(&self) -> &str {
        ApiClient::timezone(self)
    }

    fn idle_timeout(&self) -> Option<Duration> {
        self.stream_idle_timeout()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMode {
    /// Chat with a published agent; turns are stored as a conversation.
    Live,
    /// Try out an agent from its builder before publishing.
    Test,
}

/// Conversation state for one agent: remembers the server-assigned id.
///
/// Sends take `&mut self`, so a second message on the same session cannot
/// start while a stream is still being read.
#[derive(Debug, Clone)]
pub struct ChatSession {
    agent_id: String,
    mode: ChatMode,
    conversation_id: Option<String>,
}

impl ChatSession {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            mode: ChatMode::Live,
            conversation_id: None,
        }
    }

    pub fn for_testing(agent_id: impl Into<String>) -> Self {
        Self {
            mode: ChatMode::Test,
            ..Self::new(agent_id)
        }
    }

    pub fn resume(agent_id: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: Some(conversation_id.into()),
            ..Self::new(agent_id)
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// Forget the conversation so the next send starts a new one.
    pub fn reset(&mut self) {
        self.conversation_id = None;
    }

    pub fn stream_path(&self) -> String {
        match self.mode {
            ChatMode::Live => format!("/api/agents/{}/chat/stream", self.agent_id),
            ChatMode::Test => format!("/api/agents/{}/test-chat/stream", self.agent_id),
        }
    }

    /// Send through the live chat endpoint regardless of the session mode.
    pub async fn send_message_streaming<S, R>(
        &mut self,
        source: &S,
        message: &str,
        renderer: &mut R,
    ) -> TurnOutcome
    where
        S: ChatStreamSource + ?Sized,
        R: ChatRenderer + ?Sized,
    {
        let path = format!("/api/agents/{}/chat/stream", self.agent_id);
        self.drive(source, &path, message, renderer).await
    }

    /// Send through the agent test endpoint regardless of the session mode.
    pub async fn send_test_message_streaming<S, R>(
        &mut self,
        source: &S,
        message: &str,
        renderer: &mut R,
    ) -> TurnOutcome
    where
        S: ChatStreamSource + ?Sized,
        R: ChatRenderer + ?Sized,
    {
        let path = format!("/api/agents/{}/test-chat/stream", self.agent_id);
        self.drive(source, &path, message, renderer).await
    }

    /// Send through the endpoint matching this session's mode.
    pub async fn send<S, R>(&mut self, source: &S, message: &str, renderer: &mut R) -> TurnOutcome
    where
        S: ChatStreamSource + ?Sized,
        R: ChatRenderer + ?Sized,
    {
        let path = self.stream_path();
        self.drive(source, &path, message, renderer).await
    }

    async fn drive<S, R>(
        &mut self,
        source: &S,
        path: &str,
        message: &str,
        renderer: &mut R,
    ) -> TurnOutcome
    where
        S: ChatStreamSource + ?Sized,
        R: ChatRenderer + ?Sized,
    {
        let mut turn = ChatTurn::new(renderer);
        turn.begin();

        let request = ChatRequest {
            message,
            conversation_id: self.conversation_id.as_deref(),
            timezone: source.timezone(),
        };
        debug!(path, has_conversation = request.conversation_id.is_some(), "Sending chat message");

        let result = read_stream(source, path, &request, &mut turn).await;
        if let Err(e) = result {
            turn.fail(&e);
        }

        let outcome = turn.into_outcome();
        if let Some(id) = &outcome.conversation_id {
            self.conversation_id = Some(id.clone());
        }
        info!(state = ?outcome.state, "Chat turn finished");
        outcome
    }
}

async fn read_stream<S, R>(
    source: &S,
    path: &str,
    request: &ChatRequest<'_>,
    turn: &mut ChatTurn<'_, R>,
) -> AgentloomResult<()>
where
    S: ChatStreamSource + ?Sized,
    R: ChatRenderer + ?Sized,
{
    let mut stream = source.open_chat_stream(path, request).await?;
    let mut decoder = SseDecoder::new();
    let idle = source.idle_timeout();

    loop {
        let next = match idle {
            Some(limit) => tokio::time::timeout(limit, stream.next())
                .await
                .map_err(|_| AgentloomError::StreamIdle(limit.as_secs()))?,
            None => stream.next().await,
        };
        let Some(chunk) = next else {
            break;
        };

        for event in decoder.feed(&chunk?) {
            if turn.handle(event).is_break() {
                return Ok(());
            }
        }
    }

    for event in decoder.finish() {
        if turn.handle(event).is_break() {
            return Ok(());
        }
    }

    turn.end_of_stream();
    Ok(())
}

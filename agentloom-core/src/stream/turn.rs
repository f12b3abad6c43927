use std::ops::ControlFlow;
use tracing::{debug, warn};

use super::event::StreamEvent;
use crate::error::AgentloomError;
use crate::models::Source;

pub const NO_RESPONSE_MESSAGE: &str = "No response received";
pub const CONNECTION_ERROR_MESSAGE: &str = "Connection error";
pub const STREAM_CLOSED_MESSAGE: &str = "Connection closed before the response completed";

/// Output surface for one chat turn.
///
/// The "thinking" placeholder is a single status line that is shown once,
/// overwritten in place, and removed before any final message or error.
pub trait ChatRenderer {
    fn show_thinking(&mut self);
    fn update_thinking(&mut self, status: &str);
    fn remove_thinking(&mut self);
    fn render_response(&mut self, content: &str, sources: &[Source]);
    fn render_error(&mut self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Sending,
    Streaming,
    Done,
    Error,
}

impl TurnState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnState::Done | TurnState::Error)
    }
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub state: TurnState,
    pub response: Option<String>,
    pub sources: Vec<Source>,
    pub conversation_id: Option<String>,
    pub error: Option<String>,
}

impl TurnOutcome {
    pub fn is_success(&self) -> bool {
        self.state == TurnState::Done && self.response.is_some()
    }
}

/// Drives one message send from placeholder to final render.
pub struct ChatTurn<'r, R: ChatRenderer + ?Sized> {
    renderer: &'r mut R,
    state: TurnState,
    content: String,
    sources: Vec<Source>,
    conversation_id: Option<String>,
    error: Option<String>,
    placeholder_visible: bool,
}

impl<'r, R: ChatRenderer + ?Sized> ChatTurn<'r, R> {
    pub fn new(renderer: &'r mut R) -> Self {
        Self {
            renderer,
            state: TurnState::Idle,
            content: String::new(),
            sources: Vec::new(),
            conversation_id: None,
            error: None,
            placeholder_visible: false,
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn begin(&mut self) {
        if self.state != TurnState::Idle {
            return;
        }
        self.renderer.show_thinking();
        self.placeholder_visible = true;
        self.state = TurnState::Sending;
    }

    /// Apply one event. Breaks once the turn has reached a terminal state.
    pub fn handle(&mut self, event: StreamEvent) -> ControlFlow<()> {
        if self.state.is_terminal() {
            return ControlFlow::Break(());
        }
        self.state = TurnState::Streaming;

        if let Some(status) = event.status_text() {
            if self.placeholder_visible {
                self.renderer.update_thinking(&status);
            }
            return ControlFlow::Continue(());
        }

        match event {
            StreamEvent::ConversationId(id) => {
                debug!(conversation_id = %id, "Server assigned conversation");
                self.conversation_id = Some(id);
            }
            StreamEvent::Content(chunk) => self.content.push_str(&chunk),
            StreamEvent::Sources(sources) => self.sources = sources,
            StreamEvent::Done => {
                self.remove_placeholder();
                if self.content.is_empty() {
                    self.finish_with_error(NO_RESPONSE_MESSAGE.to_string());
                } else {
                    self.renderer.render_response(&self.content, &self.sources);
                    self.state = TurnState::Done;
                }
                return ControlFlow::Break(());
            }
            StreamEvent::Error(message) => {
                self.remove_placeholder();
                self.finish_with_error(message);
                return ControlFlow::Break(());
            }
            StreamEvent::Other { kind, .. } => {
                debug!(kind = %kind, "Ignoring unknown stream event");
            }
            StreamEvent::Thinking(_) | StreamEvent::ToolCall(_) | StreamEvent::ToolResult(_) => {}
        }

        ControlFlow::Continue(())
    }

    /// The body ended without `done` or `error`.
    pub fn end_of_stream(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.remove_placeholder();
        if self.content.is_empty() {
            warn!("Chat stream closed without a terminal event");
            self.finish_with_error(STREAM_CLOSED_MESSAGE.to_string());
        } else {
            warn!("Chat stream closed without 'done'; rendering partial response");
            self.renderer.render_response(&self.content, &self.sources);
            self.state = TurnState::Done;
        }
    }

    /// Transport or decoding failure outside the event loop.
    pub fn fail(&mut self, error: &AgentloomError) {
        if self.state.is_terminal() {
            return;
        }
        warn!("Chat stream failed: {}", error);
        self.remove_placeholder();
        self.finish_with_error(CONNECTION_ERROR_MESSAGE.to_string());
    }

    pub fn into_outcome(mut self) -> TurnOutcome {
        // Any exit path leaves the placeholder removed.
        self.remove_placeholder();
        let response = (self.state == TurnState::Done).then(|| std::mem::take(&mut self.content));
        TurnOutcome {
            state: self.state,
            response,
            sources: std::mem::take(&mut self.sources),
            conversation_id: self.conversation_id.take(),
            error: self.error.take(),
        }
    }

    fn finish_with_error(&mut self, message: String) {
        self.renderer.render_error(&message);
        self.error = Some(message);
        self.state = TurnState::Error;
    }

    fn remove_placeholder(&mut self) {
        if self.placeholder_visible {
            self.renderer.remove_thinking();
            self.placeholder_visible = false;
        }
    }
}

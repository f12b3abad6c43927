//! Streaming chat client.
//!
//! [`SseDecoder`] turns raw body chunks into [`StreamEvent`]s, [`ChatTurn`]
//! applies them to a [`ChatRenderer`], and [`ChatSession`] ties both to an
//! HTTP stream and keeps the conversation id between sends.

mod decoder;
mod event;
mod session;
mod turn;

pub use decoder::SseDecoder;
pub use event::StreamEvent;
pub use session::{ByteStream, ChatMode, ChatSession, ChatStreamSource};
pub use turn::{
    ChatRenderer, ChatTurn, TurnOutcome, TurnState, CONNECTION_ERROR_MESSAGE,
    NO_RESPONSE_MESSAGE, STREAM_CLOSED_MESSAGE,
};

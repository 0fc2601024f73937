//! UI Message Stream protocol support.
//!
//! The wire format spoken between the gateway and its clients: a typed
//! event union streamed as Server-Sent Events, plus the rich message/part
//! model those events materialize into.

mod encoder;
mod events;
mod message;
mod sse;

/// Protocol version advertised in the `x-vercel-ai-ui-message-stream` header.
pub const STREAM_PROTOCOL_VERSION: &str = "v1";

pub use encoder::StreamEncoder;
pub use events::StreamEvent;
pub use message::{StreamState, ToolState, UiMessage, UiMessagePart, UiRole};
pub use sse::{sse_frame, SseDecodeError, SseDecoder, SseFrame, DONE_FRAME};

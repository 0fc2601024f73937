//! Session state machines shared by every capability surface.
//!
//! One submission drives one [`StreamSession`]: idle → submitted →
//! streaming → ready/error, with cooperative cancellation that preserves
//! output already accumulated. Tool calls embedded in a stream get their
//! own nested lifecycle via [`ToolInvocation`], and finalized messages land
//! in an append-only [`MessageLog`].

mod cancel;
mod session;
mod status;
mod tool;
mod tool_state;

pub use cancel::{await_or_cancel, cancelled, is_cancelled, CancelAware, SessionCancellationToken};
pub use session::{MessageLog, SessionError, StreamSession};
pub use status::SessionStatus;
pub use tool::{
    typed_tool_schema, validate_against_schema, Tool, ToolDescriptor, ToolError, TypedTool,
};
pub use tool_state::{ToolInvocation, ToolLifecycleError};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Events of the UI Message Stream protocol.
///
/// Each event is one SSE `data:` frame. Text is streamed as
/// `text-start` / `text-delta` / `text-end` triplets; tool calls go through
/// their own `tool-input-*` / `tool-output-*` lifecycle. A stream is
/// terminated by exactly one `finish` or `error`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StreamEvent {
    /// Beginning of a new assistant message.
    #[serde(rename = "start")]
    Start {
        /// Unique identifier for the message being streamed.
        #[serde(rename = "messageId", skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
    },

    /// Beginning of a text block.
    TextStart {
        /// Identifier for this text block.
        id: String,
    },

    /// Incremental text content for an open text block.
    TextDelta {
        /// Identifier matching the `text-start` event.
        id: String,
        /// Incremental text content.
        delta: String,
    },

    /// End of a text block.
    TextEnd {
        /// Identifier matching the `text-start` event.
        id: String,
    },

    /// A tool call has started; its input is about to stream.
    ToolInputStart {
        /// Unique identifier for this tool call.
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        /// Name of the tool being called.
        #[serde(rename = "toolName")]
        tool_name: String,
    },

    /// Incremental chunk of the tool input as the model generates it.
    ToolInputDelta {
        /// Identifier matching the `tool-input-start` event.
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        /// Incremental raw input text.
        #[serde(rename = "inputTextDelta")]
        input_text_delta: String,
    },

    /// Tool input is complete and the call is ready for execution.
    ToolInputAvailable {
        /// Identifier matching the `tool-input-start` event.
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        /// Name of the tool being called.
        #[serde(rename = "toolName")]
        tool_name: String,
        /// Complete tool input as JSON.
        input: Value,
    },

    /// Result of a successful tool execution.
    ToolOutputAvailable {
        /// Identifier matching the `tool-input-start` event.
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        /// Tool execution result as JSON.
        output: Value,
    },

    /// A tool execution failed.
    ToolOutputError {
        /// Identifier matching the `tool-input-start` event.
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        /// Error text for display.
        #[serde(rename = "errorText")]
        error_text: String,
    },

    /// Marks the beginning of one inference step in a multi-step run.
    StartStep,

    /// Marks the completion of one inference step.
    FinishStep,

    /// Message completion.
    Finish {
        /// Reason the stream finished (stop, length, tool-calls, error, other).
        #[serde(rename = "finishReason", skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
    },

    /// Terminal error; partial output already delivered stays valid.
    Error {
        /// Error text for display.
        #[serde(rename = "errorText")]
        error_text: String,
    },
}

impl StreamEvent {
    /// Create a `start` event carrying the message id.
    pub fn start(message_id: impl Into<String>) -> Self {
        Self::Start {
            message_id: Some(message_id.into()),
        }
    }

    /// Create a `text-start` event.
    pub fn text_start(id: impl Into<String>) -> Self {
        Self::TextStart { id: id.into() }
    }

    /// Create a `text-delta` event.
    pub fn text_delta(id: impl Into<String>, delta: impl Into<String>) -> Self {
        Self::TextDelta {
            id: id.into(),
            delta: delta.into(),
        }
    }

    /// Create a `text-end` event.
    pub fn text_end(id: impl Into<String>) -> Self {
        Self::TextEnd { id: id.into() }
    }

    /// Create a `tool-input-start` event.
    pub fn tool_input_start(tool_call_id: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self::ToolInputStart {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
        }
    }

    /// Create a `tool-input-delta` event.
    pub fn tool_input_delta(tool_call_id: impl Into<String>, delta: impl Into<String>) -> Self {
        Self::ToolInputDelta {
            tool_call_id: tool_call_id.into(),
            input_text_delta: delta.into(),
        }
    }

    /// Create a `tool-input-available` event.
    pub fn tool_input_available(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        input: Value,
    ) -> Self {
        Self::ToolInputAvailable {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            input,
        }
    }

    /// Create a `tool-output-available` event.
    pub fn tool_output_available(tool_call_id: impl Into<String>, output: Value) -> Self {
        Self::ToolOutputAvailable {
            tool_call_id: tool_call_id.into(),
            output,
        }
    }

    /// Create a `tool-output-error` event.
    pub fn tool_output_error(tool_call_id: impl Into<String>, error_text: impl Into<String>) -> Self {
        Self::ToolOutputError {
            tool_call_id: tool_call_id.into(),
            error_text: error_text.into(),
        }
    }

    /// Create a `start-step` event.
    pub fn start_step() -> Self {
        Self::StartStep
    }

    /// Create a `finish-step` event.
    pub fn finish_step() -> Self {
        Self::FinishStep
    }

    /// Create a `finish` event with a reason.
    pub fn finish_with_reason(reason: impl Into<String>) -> Self {
        Self::Finish {
            finish_reason: Some(reason.into()),
        }
    }

    /// Create an `error` event.
    pub fn error(error_text: impl Into<String>) -> Self {
        Self::Error {
            error_text: error_text.into(),
        }
    }

    /// Whether this event terminates the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finish { .. } | Self::Error { .. })
    }
}

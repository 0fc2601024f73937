use nexus_protocol::{ToolState, UiMessagePart};
use serde_json::Value;
use thiserror::Error;

/// Illegal tool lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal tool state transition: {from:?} -> {to:?}")]
pub struct ToolLifecycleError {
    /// State the invocation was in.
    pub from: ToolState,
    /// State that was requested.
    pub to: ToolState,
}

/// One tool call embedded in a streamed assistant message.
///
/// A nested, independent state machine parented to its owning message:
/// `input-streaming → input-available → (output-available | output-error)`.
/// The visible state never regresses; any backwards (or skipping) request
/// is rejected with [`ToolLifecycleError`].
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    /// Tool call identifier.
    pub tool_call_id: String,
    /// Name of the invoked tool.
    pub tool_name: String,
    state: ToolState,
    input_buffer: String,
    input: Option<Value>,
    output: Option<Value>,
    error_text: Option<String>,
}

impl ToolInvocation {
    /// Start tracking a call; input begins streaming.
    pub fn start(tool_call_id: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            state: ToolState::InputStreaming,
            input_buffer: String::new(),
            input: None,
            output: None,
            error_text: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ToolState {
        self.state
    }

    /// Raw input text accumulated while streaming.
    pub fn input_buffer(&self) -> &str {
        &self.input_buffer
    }

    /// Fixed input record, once available.
    pub fn input(&self) -> Option<&Value> {
        self.input.as_ref()
    }

    /// Output payload, once available.
    pub fn output(&self) -> Option<&Value> {
        self.output.as_ref()
    }

    /// Error text, if execution failed.
    pub fn error_text(&self) -> Option<&str> {
        self.error_text.as_deref()
    }

    fn reject(&self, to: ToolState) -> ToolLifecycleError {
        ToolLifecycleError {
            from: self.state,
            to,
        }
    }

    /// Append a chunk of streamed input text.
    pub fn append_input_delta(&mut self, delta: &str) -> Result<(), ToolLifecycleError> {
        if self.state != ToolState::InputStreaming {
            return Err(self.reject(ToolState::InputStreaming));
        }
        self.input_buffer.push_str(delta);
        Ok(())
    }

    /// Fix the complete input record: `input-streaming → input-available`.
    pub fn input_available(&mut self, input: Value) -> Result<(), ToolLifecycleError> {
        if self.state != ToolState::InputStreaming {
            return Err(self.reject(ToolState::InputAvailable));
        }
        self.input = Some(input);
        self.state = ToolState::InputAvailable;
        Ok(())
    }

    /// Record the execution output: `input-available → output-available`.
    pub fn output_available(&mut self, output: Value) -> Result<(), ToolLifecycleError> {
        if self.state != ToolState::InputAvailable {
            return Err(self.reject(ToolState::OutputAvailable));
        }
        self.output = Some(output);
        self.state = ToolState::OutputAvailable;
        Ok(())
    }

    /// Record an execution failure: `input-available → output-error`.
    pub fn output_error(&mut self, error_text: impl Into<String>) -> Result<(), ToolLifecycleError> {
        if self.state != ToolState::InputAvailable {
            return Err(self.reject(ToolState::OutputError));
        }
        self.error_text = Some(error_text.into());
        self.state = ToolState::OutputError;
        Ok(())
    }

    /// Whether the invocation reached a terminal state.
    pub fn is_terminated(&self) -> bool {
        matches!(
            self.state,
            ToolState::OutputAvailable | ToolState::OutputError
        )
    }

    /// Snapshot as a message part, for finalizing into the message log.
    pub fn to_part(&self) -> UiMessagePart {
        UiMessagePart::Tool {
            tool_call_id: self.tool_call_id.clone(),
            tool_name: self.tool_name.clone(),
            state: self.state,
            input: self.input.clone(),
            output: self.output.clone(),
            error_text: self.error_text.clone(),
        }
    }
}

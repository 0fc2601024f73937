use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Streaming state of a text part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamState {
    /// Content is still streaming.
    Streaming,
    /// Content streaming is complete.
    Done,
}

/// Lifecycle state of a tool invocation as seen by a client.
///
/// Legal order: `InputStreaming → InputAvailable → OutputAvailable | OutputError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolState {
    /// Tool input is being streamed.
    InputStreaming,
    /// Tool input is complete, ready for execution.
    InputAvailable,
    /// Tool execution completed with output.
    OutputAvailable,
    /// Tool execution failed.
    OutputError,
}

impl ToolState {
    /// Position along the lifecycle, for monotonicity checks.
    pub fn rank(self) -> u8 {
        match self {
            Self::InputStreaming => 0,
            Self::InputAvailable => 1,
            Self::OutputAvailable | Self::OutputError => 2,
        }
    }
}

/// A part of a UI message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum UiMessagePart {
    /// Text content.
    Text {
        /// The text content.
        text: String,
        /// Optional streaming state.
        #[serde(skip_serializing_if = "Option::is_none")]
        state: Option<StreamState>,
    },

    /// File attachment, carried as a URL (typically a data URL for uploads).
    File {
        /// File URL.
        url: String,
        /// IANA media type.
        #[serde(rename = "mediaType")]
        media_type: String,
    },

    /// Tool invocation with its own lifecycle.
    #[serde(rename = "tool-invocation")]
    Tool {
        /// Tool call identifier.
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        /// Tool name.
        #[serde(rename = "toolName")]
        tool_name: String,
        /// Lifecycle state.
        state: ToolState,
        /// Tool input (present from `input-available` on).
        #[serde(skip_serializing_if = "Option::is_none")]
        input: Option<Value>,
        /// Tool output (present in `output-available`).
        #[serde(skip_serializing_if = "Option::is_none")]
        output: Option<Value>,
        /// Error text (present in `output-error`).
        #[serde(rename = "errorText", skip_serializing_if = "Option::is_none")]
        error_text: Option<String>,
    },
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiRole {
    /// System instruction.
    System,
    /// End-user message.
    User,
    /// Model response.
    Assistant,
}

/// A message with rich parts; immutable once finalized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiMessage {
    /// Unique identifier.
    pub id: String,
    /// Author role.
    pub role: UiRole,
    /// Ordered message parts.
    pub parts: Vec<UiMessagePart>,
}

impl UiMessage {
    /// Create an empty message.
    pub fn new(id: impl Into<String>, role: UiRole) -> Self {
        Self {
            id: id.into(),
            role,
            parts: Vec::new(),
        }
    }

    /// Create a user message with a single finished text part.
    pub fn user(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: UiRole::User,
            parts: vec![UiMessagePart::Text {
                text: text.into(),
                state: Some(StreamState::Done),
            }],
        }
    }

    /// Create an empty assistant message.
    pub fn assistant(id: impl Into<String>) -> Self {
        Self::new(id, UiRole::Assistant)
    }

    /// Append a part.
    #[must_use]
    pub fn with_part(mut self, part: UiMessagePart) -> Self {
        self.parts.push(part);
        self
    }

    /// All text content, concatenated in part order.
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                UiMessagePart::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// File parts, in order.
    pub fn file_parts(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parts.iter().filter_map(|p| match p {
            UiMessagePart::File { url, media_type } => Some((url.as_str(), media_type.as_str())),
            _ => None,
        })
    }
}

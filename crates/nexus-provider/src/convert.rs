//! Pure conversions between protocol messages and genai chat types.

use crate::collector::ToolCallRequest;
use genai::chat::{ChatMessage, ChatRequest, ContentPart, MessageContent, ToolResponse};
use nexus_protocol::{UiMessage, UiMessagePart, UiRole};
use nexus_session::ToolDescriptor;
use serde_json::Value;

/// Convert a tool descriptor to a genai tool definition.
pub fn to_genai_tool(desc: &ToolDescriptor) -> genai::chat::Tool {
    genai::chat::Tool::new(&desc.name)
        .with_description(&desc.description)
        .with_schema(desc.parameters.clone())
}

/// Split a `data:` URL into media type and base64 payload.
///
/// Returns `None` for anything that is not a base64 data URL.
pub fn parse_data_url(url: &str) -> Option<(String, String)> {
    let rest = url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let media_type = meta.strip_suffix(";base64")?;
    if media_type.is_empty() || payload.is_empty() {
        return None;
    }
    Some((media_type.to_string(), payload.to_string()))
}

/// Convert one UI message into a genai chat message.
///
/// User messages with file parts become multi-part content: image files
/// (base64 data URLs) are forwarded as inline images, anything else is
/// dropped. Tool invocation parts in history are not replayed; their
/// results are already reflected in the surrounding text.
fn to_chat_message(msg: &UiMessage) -> Option<ChatMessage> {
    let text = msg.text_content();
    match msg.role {
        UiRole::System => Some(ChatMessage::system(text)),
        UiRole::Assistant => {
            if text.is_empty() {
                None
            } else {
                Some(ChatMessage::assistant(text))
            }
        }
        UiRole::User => {
            let images: Vec<(String, String)> = msg
                .parts
                .iter()
                .filter_map(|p| match p {
                    UiMessagePart::File { url, .. } => parse_data_url(url),
                    _ => None,
                })
                .filter(|(media_type, _)| media_type.starts_with("image/"))
                .collect();

            if images.is_empty() {
                return Some(ChatMessage::user(text));
            }

            let mut parts: Vec<ContentPart> = Vec::new();
            if !text.is_empty() {
                parts.push(ContentPart::from_text(text));
            }
            for (media_type, payload) in images {
                parts.push(ContentPart::from_binary_base64(media_type, payload, None));
            }
            Some(ChatMessage::user(MessageContent::from(parts)))
        }
    }
}

/// Build a chat request from history, an optional system prompt, and tools.
pub fn build_chat_request(
    system: Option<&str>,
    messages: &[UiMessage],
    tools: &[ToolDescriptor],
) -> ChatRequest {
    let mut chat_messages: Vec<ChatMessage> = Vec::with_capacity(messages.len() + 1);
    if let Some(system) = system {
        chat_messages.push(ChatMessage::system(system));
    }
    chat_messages.extend(messages.iter().filter_map(to_chat_message));

    let mut request = ChatRequest::new(chat_messages);
    if !tools.is_empty() {
        request = request.with_tools(tools.iter().map(to_genai_tool).collect::<Vec<_>>());
    }
    request
}

/// Assistant turn that requested tool calls, for the follow-up request.
pub fn assistant_with_tool_calls(text: &str, calls: &[ToolCallRequest]) -> ChatMessage {
    let mut content = MessageContent::from(text);
    for call in calls {
        content.push(ContentPart::ToolCall(genai::chat::ToolCall {
            call_id: call.id.clone(),
            fn_name: call.name.clone(),
            fn_arguments: call.arguments.clone(),
        }));
    }
    ChatMessage::assistant(content)
}

/// Tool execution result as a chat message for the follow-up request.
pub fn tool_response_message(call_id: &str, payload: &Value) -> ChatMessage {
    ChatMessage::from(ToolResponse {
        call_id: call_id.to_string(),
        content: payload.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_base64_data_urls() {
        let (mt, payload) = parse_data_url("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(mt, "image/png");
        assert_eq!(payload, "iVBORw0KGgo=");
    }

    #[test]
    fn rejects_non_data_urls() {
        assert!(parse_data_url("https://example.com/cat.png").is_none());
        assert!(parse_data_url("data:text/plain,hello").is_none());
        assert!(parse_data_url("data:;base64,").is_none());
    }

    #[test]
    fn builds_request_with_system_and_history() {
        let messages = vec![
            UiMessage::user("u1", "What is 2+2?"),
            UiMessage::assistant("a1").with_part(nexus_protocol::UiMessagePart::Text {
                text: "4".into(),
                state: None,
            }),
            UiMessage::user("u2", "And 4*4?"),
        ];
        let request = build_chat_request(Some("You are terse."), &messages, &[]);
        assert_eq!(request.messages.len(), 4);
        assert!(request.tools.is_none());
    }

    #[test]
    fn empty_assistant_messages_are_skipped() {
        let messages = vec![UiMessage::user("u1", "hi"), UiMessage::assistant("a1")];
        let request = build_chat_request(None, &messages, &[]);
        assert_eq!(request.messages.len(), 1);
    }

    #[test]
    fn tools_are_attached_when_present() {
        let desc = ToolDescriptor::new("weather", "Get the weather").with_parameters(json!({
            "type": "object",
            "properties": { "location": { "type": "string" } },
            "required": ["location"]
        }));
        let request = build_chat_request(None, &[UiMessage::user("u", "weather?")], &[desc]);
        let tools = request.tools.expect("tools should be set");
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "weather");
    }

    #[test]
    fn genai_tool_carries_schema() {
        let desc = ToolDescriptor::new("weather", "Get the weather")
            .with_parameters(json!({"type": "object"}));
        let tool = to_genai_tool(&desc);
        assert_eq!(tool.name, "weather");
        assert_eq!(tool.description.as_deref(), Some("Get the weather"));
    }
}

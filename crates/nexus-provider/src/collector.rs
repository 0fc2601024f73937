//! Accumulation of streamed chat events into text and tool calls.

use genai::chat::{ChatStreamEvent, Usage};
use serde_json::Value;
use std::collections::HashMap;

/// A tool call requested by the model, with parsed arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    /// Provider-assigned call id.
    pub id: String,
    /// Tool name.
    pub name: String,
    /// Parsed argument object (`Null` when arguments failed to parse).
    pub arguments: Value,
}

/// Partial tool call being collected during streaming.
#[derive(Debug, Clone)]
struct PartialToolCall {
    name: String,
    arguments: String,
}

/// Notable output derived from one stream event.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutput {
    /// Text content delta.
    TextDelta(String),
    /// A tool call started; name is known.
    ToolCallStart {
        /// Call id.
        id: String,
        /// Tool name.
        name: String,
    },
    /// Incremental tool argument text.
    ToolCallDelta {
        /// Call id.
        id: String,
        /// Argument text newly seen in this chunk.
        args_delta: String,
    },
}

/// Final result of a collected stream.
#[derive(Debug, Clone)]
pub struct CollectedResponse {
    /// Full assistant text.
    pub text: String,
    /// Tool calls in first-seen order.
    pub tool_calls: Vec<ToolCallRequest>,
    /// Token usage captured from the `End` event, when available.
    pub usage: Option<Usage>,
}

impl CollectedResponse {
    /// Whether the model requested tool execution.
    pub fn needs_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Collector for streaming chat responses.
///
/// Feed every [`ChatStreamEvent`] through [`process`](Self::process); it
/// accumulates text and tool calls and reports the increments worth
/// relaying. The `End` event is the source of truth for tool calls: some
/// providers stream accumulated rather than delta argument values, so the
/// captured calls override whatever was collected chunk by chunk.
#[derive(Debug, Default)]
pub struct StreamCollector {
    text: String,
    tool_calls: HashMap<String, PartialToolCall>,
    tool_call_order: Vec<String>,
    usage: Option<Usage>,
}

impl StreamCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one stream event, returning an output if something notable
    /// happened.
    pub fn process(&mut self, event: ChatStreamEvent) -> Option<StreamOutput> {
        match event {
            ChatStreamEvent::Chunk(chunk) => {
                if chunk.content.is_empty() {
                    return None;
                }
                self.text.push_str(&chunk.content);
                Some(StreamOutput::TextDelta(chunk.content))
            }

            ChatStreamEvent::ToolCallChunk(tool_chunk) => {
                let call_id = tool_chunk.tool_call.call_id.clone();

                let partial = match self.tool_calls.entry(call_id.clone()) {
                    std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
                    std::collections::hash_map::Entry::Vacant(e) => {
                        self.tool_call_order.push(call_id.clone());
                        e.insert(PartialToolCall {
                            name: String::new(),
                            arguments: String::new(),
                        })
                    }
                };

                let mut output = None;

                if !tool_chunk.tool_call.fn_name.is_empty() && partial.name.is_empty() {
                    partial.name = tool_chunk.tool_call.fn_name.clone();
                    output = Some(StreamOutput::ToolCallStart {
                        id: call_id.clone(),
                        name: partial.name.clone(),
                    });
                }

                // genai wraps streamed argument text in Value::String;
                // .to_string() on it would add JSON quotes. Chunks may carry
                // the accumulated value rather than a delta, so replace and
                // diff instead of appending blindly.
                let args_str = match &tool_chunk.tool_call.fn_arguments {
                    Value::String(s) if !s.is_empty() => s.clone(),
                    Value::Null | Value::String(_) => String::new(),
                    other => other.to_string(),
                };
                if !args_str.is_empty() {
                    let delta = if args_str.len() > partial.arguments.len()
                        && args_str.starts_with(&partial.arguments)
                    {
                        args_str[partial.arguments.len()..].to_string()
                    } else {
                        args_str.clone()
                    };
                    partial.arguments = args_str;
                    // Keep ToolCallStart when name and args arrive together.
                    if !delta.is_empty() && output.is_none() {
                        output = Some(StreamOutput::ToolCallDelta {
                            id: call_id,
                            args_delta: delta,
                        });
                    }
                }

                output
            }

            ChatStreamEvent::End(end) => {
                if let Some(tool_calls) = end.captured_tool_calls() {
                    for tc in tool_calls {
                        let end_args = match &tc.fn_arguments {
                            Value::String(s) if !s.is_empty() => s.clone(),
                            Value::Null | Value::String(_) => String::new(),
                            other => other.to_string(),
                        };
                        match self.tool_calls.entry(tc.call_id.clone()) {
                            std::collections::hash_map::Entry::Occupied(mut e) => {
                                let partial = e.get_mut();
                                if partial.name.is_empty() {
                                    partial.name = tc.fn_name.clone();
                                }
                                if !end_args.is_empty() {
                                    partial.arguments = end_args;
                                }
                            }
                            std::collections::hash_map::Entry::Vacant(e) => {
                                self.tool_call_order.push(tc.call_id.clone());
                                e.insert(PartialToolCall {
                                    name: tc.fn_name.clone(),
                                    arguments: end_args,
                                });
                            }
                        }
                    }
                }
                self.usage = end.captured_usage;
                None
            }

            _ => None,
        }
    }

    /// Text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether any tool calls have been seen.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Finish collecting and return the final result.
    pub fn finish(self) -> CollectedResponse {
        let mut remaining = self.tool_calls;
        let mut tool_calls = Vec::with_capacity(self.tool_call_order.len());

        for call_id in self.tool_call_order {
            let Some(p) = remaining.remove(&call_id) else {
                continue;
            };
            if p.name.is_empty() {
                continue;
            }
            let arguments = serde_json::from_str(&p.arguments).unwrap_or(Value::Null);
            tool_calls.push(ToolCallRequest {
                id: call_id,
                name: p.name,
                arguments,
            });
        }

        CollectedResponse {
            text: self.text,
            tool_calls,
            usage: self.usage,
        }
    }
}

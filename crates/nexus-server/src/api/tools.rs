//! Tool-calling chat endpoint.

use super::{log_usage, new_message_id};
use crate::error::ApiError;
use crate::state::AppState;
use crate::transport::{frame_channel, ui_stream_response, FrameSender};
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use futures::StreamExt;
use genai::chat::ChatRequest;
use nexus_protocol::StreamEncoder;
use nexus_provider::{
    assistant_with_tool_calls, build_chat_request, default_chat_options, tool_response_message,
    ChatEventStream, ChatExecutor, StreamCollector, StreamOutput,
};
use serde_json::json;
use tracing::warn;

use super::chat::ChatBody;

/// Upper bound on inference rounds per submission; each tool round feeds
/// results back for one follow-up.
const MAX_TOOL_ROUNDS: usize = 4;

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Use the get_weather tool whenever the user asks about weather.";

/// `POST /api/tools`: chat with the registered tools, streaming the tool
/// lifecycle (`tool-input-*`, `tool-output-*`) along with assistant text.
pub async fn tools_chat(
    State(st): State<AppState>,
    Json(body): Json<ChatBody>,
) -> Result<Response, ApiError> {
    let has_user_text = body
        .messages
        .iter()
        .rev()
        .find(|m| m.role == nexus_protocol::UiRole::User)
        .is_some_and(|m| !m.text_content().trim().is_empty());
    if !has_user_text {
        return Err(ApiError::bad_request("message text is empty"));
    }

    let request = build_chat_request(Some(SYSTEM_PROMPT), &body.messages, &st.tools.descriptors());
    let options = default_chat_options();
    let events = st
        .executor
        .exec_chat_stream(&st.models.chat_model, request.clone(), Some(&options))
        .await
        .map_err(ApiError::inference)?;

    let (sender, body_stream) = frame_channel();
    tokio::spawn(run_tool_loop(st, request, events, sender));
    Ok(ui_stream_response(body_stream))
}

/// Drive the bounded tool loop over the stream.
async fn run_tool_loop(
    st: AppState,
    mut request: ChatRequest,
    mut events: ChatEventStream,
    sender: FrameSender,
) {
    let model = st.models.chat_model.clone();
    let options = default_chat_options();

    let mut encoder = StreamEncoder::new(new_message_id());
    if sender.send_events(&encoder.prologue()).await.is_err() {
        return;
    }
    if sender.send_events(&encoder.start_step()).await.is_err() {
        return;
    }

    for round in 0..MAX_TOOL_ROUNDS {
        let mut collector = StreamCollector::new();

        while let Some(event) = events.next().await {
            let output = match event {
                Ok(event) => collector.process(event),
                Err(err) => {
                    warn!(error = %err, model, round, "provider stream failed");
                    let _ = sender.send_events(&encoder.error(&err.to_string())).await;
                    sender.send_done().await;
                    return;
                }
            };
            let frames = match output {
                Some(StreamOutput::TextDelta(delta)) => encoder.text_delta(&delta),
                Some(StreamOutput::ToolCallStart { id, name }) => {
                    encoder.tool_input_start(&id, &name)
                }
                Some(StreamOutput::ToolCallDelta { id, args_delta }) => {
                    encoder.tool_input_delta(&id, &args_delta)
                }
                None => continue,
            };
            if sender.send_events(&frames).await.is_err() {
                return;
            }
        }

        let collected = collector.finish();
        log_usage(&model, collected.usage.as_ref());

        if !collected.needs_tools() {
            let mut frames = encoder.finish_step();
            frames.extend(encoder.finish("stop"));
            let _ = sender.send_events(&frames).await;
            sender.send_done().await;
            return;
        }

        // Execute each requested call and stream its lifecycle through.
        let mut results = Vec::with_capacity(collected.tool_calls.len());
        for call in &collected.tool_calls {
            let frames =
                encoder.tool_input_available(&call.id, &call.name, call.arguments.clone());
            if sender.send_events(&frames).await.is_err() {
                return;
            }

            let payload = match st.tools.execute(&call.name, call.arguments.clone()).await {
                Ok(output) => {
                    let frames = encoder.tool_output_available(&call.id, output.clone());
                    if sender.send_events(&frames).await.is_err() {
                        return;
                    }
                    output
                }
                Err(err) => {
                    warn!(error = %err, tool = %call.name, "tool execution failed");
                    let frames = encoder.tool_output_error(&call.id, &err.to_string());
                    if sender.send_events(&frames).await.is_err() {
                        return;
                    }
                    json!({ "error": err.to_string() })
                }
            };
            results.push((call.id.clone(), payload));
        }

        // Feed the results back for the follow-up round.
        request = request.append_message(assistant_with_tool_calls(
            &collected.text,
            &collected.tool_calls,
        ));
        for (call_id, payload) in &results {
            request = request.append_message(tool_response_message(call_id, payload));
        }

        let mut frames = encoder.finish_step();
        if round + 1 < MAX_TOOL_ROUNDS {
            frames.extend(encoder.start_step());
        }
        if sender.send_events(&frames).await.is_err() {
            return;
        }
        if round + 1 == MAX_TOOL_ROUNDS {
            break;
        }

        events = match st
            .executor
            .exec_chat_stream(&model, request.clone(), Some(&options))
            .await
        {
            Ok(events) => events,
            Err(err) => {
                warn!(error = %err, model, "follow-up inference failed");
                let _ = sender.send_events(&encoder.error(&err.to_string())).await;
                sender.send_done().await;
                return;
            }
        };
    }

    // Round limit reached with tools still being requested.
    let _ = sender.send_events(&encoder.finish("tool-calls")).await;
    sender.send_done().await;
}

//! Chat, multi-modal chat, and prompt streaming endpoints.

use super::{log_usage, new_message_id};
use crate::error::ApiError;
use crate::state::AppState;
use crate::transport::{frame_channel, ui_stream_response, FrameSender};
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use futures::StreamExt;
use genai::chat::{ChatMessage, ChatRequest};
use nexus_protocol::{StreamEncoder, UiMessage, UiRole};
use nexus_provider::{
    build_chat_request, default_chat_options, ChatEventStream, ChatExecutor, StreamCollector,
    StreamOutput,
};
use serde::Deserialize;
use tracing::warn;

/// Body of the chat endpoints: the full message history.
#[derive(Debug, Deserialize)]
pub struct ChatBody {
    /// Conversation so far, newest last.
    pub messages: Vec<UiMessage>,
}

/// Body of the prompt streaming endpoint.
#[derive(Debug, Deserialize)]
pub struct PromptBody {
    /// Prompt to stream a response for.
    pub prompt: String,
}

fn latest_user_message(messages: &[UiMessage]) -> Option<&UiMessage> {
    messages.iter().rev().find(|m| m.role == UiRole::User)
}

/// `POST /api/chat`: stream an assistant reply for the conversation.
pub async fn chat(
    State(st): State<AppState>,
    Json(body): Json<ChatBody>,
) -> Result<Response, ApiError> {
    let latest = latest_user_message(&body.messages)
        .ok_or_else(|| ApiError::bad_request("messages must contain a user message"))?;
    if latest.text_content().trim().is_empty() {
        return Err(ApiError::bad_request("message text is empty"));
    }

    let request = build_chat_request(None, &body.messages, &[]);
    let model = st.models.chat_model.clone();
    start_text_stream(st, model, request).await
}

/// `POST /api/multi-modal-chat`: like chat, but file parts (data URLs) are
/// forwarded to a vision-capable model. Text may be empty when files are
/// attached.
pub async fn multi_modal_chat(
    State(st): State<AppState>,
    Json(body): Json<ChatBody>,
) -> Result<Response, ApiError> {
    let latest = latest_user_message(&body.messages)
        .ok_or_else(|| ApiError::bad_request("messages must contain a user message"))?;
    if latest.text_content().trim().is_empty() && latest.file_parts().count() == 0 {
        return Err(ApiError::bad_request("message needs text or a file"));
    }

    let request = build_chat_request(None, &body.messages, &[]);
    let model = st.models.vision_model.clone();
    start_text_stream(st, model, request).await
}

/// `POST /api/stream`: stream a completion for a bare prompt.
pub async fn stream(
    State(st): State<AppState>,
    Json(body): Json<PromptBody>,
) -> Result<Response, ApiError> {
    if body.prompt.trim().is_empty() {
        return Err(ApiError::bad_request("prompt is empty"));
    }

    let request = ChatRequest::new(vec![ChatMessage::user(body.prompt)]);
    let model = st.models.chat_model.clone();
    start_text_stream(st, model, request).await
}

/// Kick off the provider stream (so startup failures map to an HTTP error)
/// and relay it as a UI message stream.
async fn start_text_stream(
    st: AppState,
    model: String,
    request: ChatRequest,
) -> Result<Response, ApiError> {
    let options = default_chat_options();
    let events = st
        .executor
        .exec_chat_stream(&model, request, Some(&options))
        .await
        .map_err(ApiError::inference)?;

    let (sender, body_stream) = frame_channel();
    tokio::spawn(relay_text_stream(events, sender, model));
    Ok(ui_stream_response(body_stream))
}

/// Pump a text-only provider stream into protocol events.
///
/// A failed send means the client disconnected; returning drops the
/// provider stream, which releases the upstream connection.
pub(crate) async fn relay_text_stream(
    mut events: ChatEventStream,
    sender: FrameSender,
    model: String,
) {
    let mut encoder = StreamEncoder::new(new_message_id());
    if sender.send_events(&encoder.prologue()).await.is_err() {
        return;
    }

    let mut collector = StreamCollector::new();
    while let Some(event) = events.next().await {
        match event {
            Ok(event) => {
                if let Some(StreamOutput::TextDelta(delta)) = collector.process(event) {
                    if sender.send_events(&encoder.text_delta(&delta)).await.is_err() {
                        return;
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, model, "provider stream failed");
                let _ = sender.send_events(&encoder.error(&err.to_string())).await;
                sender.send_done().await;
                return;
            }
        }
    }

    let collected = collector.finish();
    log_usage(&model, collected.usage.as_ref());
    let _ = sender.send_events(&encoder.finish("stop")).await;
    sender.send_done().await;
}

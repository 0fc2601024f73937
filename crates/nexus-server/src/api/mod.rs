//! Route table and capability handlers.

pub mod chat;
pub mod completion;
pub mod image;
pub mod speech;
pub mod structured;
pub mod tools;
pub mod transcribe;

use crate::state::AppState;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;

/// Build the gateway router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat::chat))
        .route("/api/multi-modal-chat", post(chat::multi_modal_chat))
        .route("/api/completion", post(completion::completion))
        .route("/api/stream", post(chat::stream))
        .route("/api/tools", post(tools::tools_chat))
        .route("/api/structured-data", post(structured::structured_data))
        .route("/api/structured-array", post(structured::structured_array))
        .route("/api/generate-image", post(image::generate_image))
        .route("/api/generate-speech", post(speech::generate_speech))
        .route("/api/transcribe-audio", post(transcribe::transcribe_audio))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Fresh id for a streamed assistant message.
pub(crate) fn new_message_id() -> String {
    format!("msg_{}", uuid::Uuid::now_v7().simple())
}

/// Log provider token usage the way the demo always has: input, output, total.
pub(crate) fn log_usage(model: &str, usage: Option<&genai::chat::Usage>) {
    if let Some(usage) = usage {
        tracing::debug!(
            model,
            input_tokens = ?usage.prompt_tokens,
            output_tokens = ?usage.completion_tokens,
            total_tokens = ?usage.total_tokens,
            "inference complete"
        );
    }
}

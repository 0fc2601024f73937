//! One-shot completion endpoint.

use super::log_usage;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use genai::chat::{ChatMessage, ChatRequest};
use nexus_provider::{default_chat_options, ChatExecutor};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CompletionBody {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub text: String,
}

/// `POST /api/completion`: non-streaming completion, `{ text }` back.
pub async fn completion(
    State(st): State<AppState>,
    Json(body): Json<CompletionBody>,
) -> Result<Json<CompletionResponse>, ApiError> {
    if body.prompt.trim().is_empty() {
        return Err(ApiError::bad_request("prompt is empty"));
    }

    let request = ChatRequest::new(vec![ChatMessage::user(body.prompt)]);
    let options = default_chat_options();
    let completion = st
        .executor
        .exec_chat(&st.models.chat_model, request, Some(&options))
        .await
        .map_err(ApiError::inference)?;

    log_usage(&st.models.chat_model, completion.usage.as_ref());

    Ok(Json(CompletionResponse {
        text: completion.text,
    }))
}

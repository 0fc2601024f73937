//! Structured extraction endpoints.
//!
//! These stream the raw JSON document as plain text while the model
//! completes it, the way the original pages consume it; the finished
//! document is checked against the schema server-side.

use super::log_usage;
use crate::error::ApiError;
use crate::schemas::{pokemon_list_schema, recipe_schema};
use crate::state::AppState;
use crate::transport::{frame_channel, text_stream_response};
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use bytes::Bytes;
use futures::StreamExt;
use genai::chat::{ChatMessage, ChatRequest, ChatResponseFormat, JsonSpec};
use nexus_provider::{default_chat_options, ChatExecutor, StreamCollector, StreamOutput};
use nexus_session::validate_against_schema;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct DishBody {
    pub dish: String,
}

#[derive(Debug, Deserialize)]
pub struct KindBody {
    #[serde(rename = "type")]
    pub kind: String,
}

/// `POST /api/structured-data`: stream a schema-constrained recipe object.
pub async fn structured_data(
    State(st): State<AppState>,
    Json(body): Json<DishBody>,
) -> Result<Response, ApiError> {
    if body.dish.trim().is_empty() {
        return Err(ApiError::bad_request("dish is empty"));
    }
    let prompt = format!("Generate a recipe for {}.", body.dish.trim());
    stream_constrained_json(st, prompt, "recipe", recipe_schema()).await
}

/// `POST /api/structured-array`: stream a schema-constrained pokémon list.
pub async fn structured_array(
    State(st): State<AppState>,
    Json(body): Json<KindBody>,
) -> Result<Response, ApiError> {
    if body.kind.trim().is_empty() {
        return Err(ApiError::bad_request("type is empty"));
    }
    let prompt = format!(
        "Generate a list of 4 fictional pokemon of type {}.",
        body.kind.trim()
    );
    stream_constrained_json(st, prompt, "pokemon_list", pokemon_list_schema()).await
}

async fn stream_constrained_json(
    st: AppState,
    prompt: String,
    schema_name: &str,
    schema: Value,
) -> Result<Response, ApiError> {
    let options = default_chat_options().with_response_format(ChatResponseFormat::JsonSpec(
        JsonSpec::new(schema_name.to_string(), schema.clone()),
    ));
    let request = ChatRequest::new(vec![ChatMessage::user(prompt)]);
    let model = st.models.chat_model.clone();

    let mut events = st
        .executor
        .exec_chat_stream(&model, request, Some(&options))
        .await
        .map_err(ApiError::inference)?;

    let (sender, body_stream) = frame_channel();
    let schema_name = schema_name.to_string();
    tokio::spawn(async move {
        let mut collector = StreamCollector::new();
        while let Some(event) = events.next().await {
            match event {
                Ok(event) => {
                    if let Some(StreamOutput::TextDelta(delta)) = collector.process(event) {
                        if sender.send_raw(Bytes::from(delta)).await.is_err() {
                            return;
                        }
                    }
                }
                Err(err) => {
                    // A plain text stream has no error channel; just stop.
                    warn!(error = %err, model, "structured stream failed");
                    return;
                }
            }
        }

        let collected = collector.finish();
        log_usage(&model, collected.usage.as_ref());

        match serde_json::from_str::<Value>(&collected.text) {
            Ok(document) => {
                if let Err(err) = validate_against_schema(&schema, &document) {
                    warn!(schema = %schema_name, error = %err, "streamed object failed validation");
                }
            }
            Err(err) => {
                warn!(schema = %schema_name, error = %err, "streamed output is not valid JSON");
            }
        }
    });

    Ok(text_stream_response(body_stream))
}

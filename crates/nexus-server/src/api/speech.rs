//! Speech synthesis endpoint.

use crate::state::AppState;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use nexus_provider::MediaClient;
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct SpeechBody {
    pub text: String,
}

/// `POST /api/generate-speech`: returns the binary audio payload with its
/// content-type, or a plain-text error with a non-200 status (this endpoint
/// has always replied plain text on failure, not JSON).
pub async fn generate_speech(
    State(st): State<AppState>,
    Json(body): Json<SpeechBody>,
) -> Response {
    if body.text.trim().is_empty() {
        return plain_error(StatusCode::BAD_REQUEST, "text is empty");
    }

    info!(model = %st.models.speech_model, chars = body.text.len(), "generating speech");
    let audio = match st
        .media
        .generate_speech(&st.models.speech_model, &st.models.speech_voice, &body.text)
        .await
    {
        Ok(audio) => audio,
        Err(err) => {
            warn!(error = %err, "speech generation failed");
            return plain_error(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string());
        }
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, audio.media_type)
        .body(Body::from(audio.bytes))
        .unwrap_or_else(|_| plain_error(StatusCode::INTERNAL_SERVER_ERROR, "response build failed"))
}

fn plain_error(status: StatusCode, message: &str) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from(message.to_string()))
        .expect("static error response")
}

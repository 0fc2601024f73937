//! Audio transcription endpoint.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Multipart, State};
use axum::Json;
use nexus_provider::MediaClient;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<TranscriptSegment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(rename = "durationInSeconds", skip_serializing_if = "Option::is_none")]
    pub duration_in_seconds: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// `POST /api/transcribe-audio`: multipart upload with an `audio` (or
/// `file`) field; returns the transcript with optional metadata.
pub async fn transcribe_audio(
    State(st): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let mut audio: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart payload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" | "file" => {
                let filename = field
                    .file_name()
                    .unwrap_or("recording.webm")
                    .to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::bad_request(format!("failed reading '{name}' field: {e}"))
                })?;
                if !bytes.is_empty() {
                    audio = Some((bytes.to_vec(), filename));
                }
            }
            _ => {}
        }
    }

    let Some((bytes, filename)) = audio else {
        return Err(ApiError::bad_request("missing audio file"));
    };

    info!(
        model = %st.models.transcription_model,
        bytes = bytes.len(),
        %filename,
        "transcribing audio"
    );
    let transcription = st
        .media
        .transcribe(&st.models.transcription_model, bytes, &filename)
        .await?;

    let segments = if transcription.segments.is_empty() {
        None
    } else {
        Some(
            transcription
                .segments
                .into_iter()
                .map(|s| TranscriptSegment {
                    start: s.start,
                    end: s.end,
                    text: s.text,
                })
                .collect(),
        )
    };

    Ok(Json(TranscriptResponse {
        text: transcription.text,
        segments,
        language: transcription.language,
        duration_in_seconds: transcription.duration_seconds,
    }))
}

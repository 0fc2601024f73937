//! Binary media capabilities over the OpenAI-compatible HTTP API.

use crate::error::ProviderError;
use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// A generated image.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    /// Base64-encoded image bytes.
    pub base64: String,
    /// Media type of the encoded image.
    pub media_type: String,
}

/// Synthesized speech audio.
#[derive(Debug, Clone)]
pub struct SpeechAudio {
    /// Raw audio payload.
    pub bytes: Bytes,
    /// Media type reported by the provider.
    pub media_type: String,
}

/// One timed segment of a transcription.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TranscriptionSegment {
    /// Segment start, seconds.
    pub start: f64,
    /// Segment end, seconds.
    pub end: f64,
    /// Segment text.
    pub text: String,
}

/// Result of an audio transcription.
#[derive(Debug, Clone, Default)]
pub struct Transcription {
    /// Full transcript text.
    pub text: String,
    /// Timed segments, when the provider reports them.
    pub segments: Vec<TranscriptionSegment>,
    /// Detected language.
    pub language: Option<String>,
    /// Audio duration in seconds.
    pub duration_seconds: Option<f64>,
}

/// Provider media capabilities used by the gateway.
#[async_trait]
pub trait MediaClient: Send + Sync {
    /// Synthesize an image for the prompt.
    async fn generate_image(&self, model: &str, prompt: &str)
        -> Result<GeneratedImage, ProviderError>;

    /// Synthesize speech for the text.
    async fn generate_speech(
        &self,
        model: &str,
        voice: &str,
        text: &str,
    ) -> Result<SpeechAudio, ProviderError>;

    /// Transcribe an uploaded audio payload.
    async fn transcribe(
        &self,
        model: &str,
        audio: Vec<u8>,
        filename: &str,
    ) -> Result<Transcription, ProviderError>;
}

/// `reqwest`-backed media client for OpenAI-compatible endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiMediaClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    segments: Vec<TranscriptionSegment>,
}

impl OpenAiMediaClient {
    /// Create a client for the given base URL (e.g. `https://api.openai.com/v1`).
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn into_api_error(response: reqwest::Response) -> ProviderError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ProviderError::from_error_body(status, &body)
    }
}

#[async_trait]
impl MediaClient for OpenAiMediaClient {
    async fn generate_image(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<GeneratedImage, ProviderError> {
        let response = self
            .client
            .post(self.url("/images/generations"))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": model,
                "prompt": prompt,
                "n": 1,
                "size": "1024x1024",
                "response_format": "b64_json",
                "style": "vivid",
                "quality": "hd",
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::into_api_error(response).await);
        }

        let payload: ImageGenerationResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        let base64 = payload
            .data
            .into_iter()
            .find_map(|d| d.b64_json)
            .ok_or_else(|| ProviderError::Decode("image payload missing b64_json".into()))?;

        debug!(model, "image generated ({} base64 chars)", base64.len());
        Ok(GeneratedImage {
            base64,
            media_type: "image/png".to_string(),
        })
    }

    async fn generate_speech(
        &self,
        model: &str,
        voice: &str,
        text: &str,
    ) -> Result<SpeechAudio, ProviderError> {
        let response = self
            .client
            .post(self.url("/audio/speech"))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": model,
                "input": text,
                "voice": voice,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::into_api_error(response).await);
        }

        let media_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();
        let bytes = response.bytes().await?;

        debug!(model, voice, "speech generated ({} bytes)", bytes.len());
        Ok(SpeechAudio { bytes, media_type })
    }

    async fn transcribe(
        &self,
        model: &str,
        audio: Vec<u8>,
        filename: &str,
    ) -> Result<Transcription, ProviderError> {
        let mime = mime_for_audio(filename);
        let part = reqwest::multipart::Part::bytes(audio)
            .file_name(filename.to_string())
            .mime_str(mime)
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .text("model", model.to_string())
            .text("response_format", "verbose_json")
            .part("file", part);

        let response = self
            .client
            .post(self.url("/audio/transcriptions"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::into_api_error(response).await);
        }

        let payload: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        debug!(model, "transcribed {} chars", payload.text.len());
        Ok(Transcription {
            text: payload.text,
            segments: payload.segments,
            language: payload.language,
            duration_seconds: payload.duration,
        })
    }
}

fn mime_for_audio(filename: &str) -> &'static str {
    match filename.rsplit('.').next() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        Some("m4a") => "audio/mp4",
        Some("flac") => "audio/flac",
        _ => "audio/webm",
    }
}

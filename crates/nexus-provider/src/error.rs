use serde_json::Value;
use thiserror::Error;

/// Errors crossing the provider boundary.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network-level failure reaching the provider.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Provider replied with a non-success status.
    #[error("{message}")]
    Api {
        /// HTTP status code of the reply.
        status: u16,
        /// Message extracted from the provider's error envelope.
        message: String,
    },

    /// Provider reply did not have the expected shape.
    #[error("unexpected provider response: {0}")]
    Decode(String),

    /// Inference call through the chat client failed.
    #[error("inference failed: {0}")]
    Inference(String),
}

impl From<genai::Error> for ProviderError {
    fn from(e: genai::Error) -> Self {
        Self::Inference(e.to_string())
    }
}

impl ProviderError {
    /// Build an [`ProviderError::Api`] from a non-success reply body.
    ///
    /// OpenAI-compatible endpoints wrap failures as
    /// `{ "error": { "message": ... } }` (sometimes `{ "error": "..." }`);
    /// fall back to the raw body, then to the status itself.
    pub fn from_error_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| match v.get("error") {
                Some(Value::String(s)) => Some(s.clone()),
                Some(obj) => obj
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                None => None,
            })
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    format!("provider returned status {status}")
                } else {
                    trimmed.chars().take(300).collect()
                }
            });
        Self::Api { status, message }
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use nexus_provider::ProviderError;

/// Errors surfaced by the gateway endpoints.
///
/// Everything is flattened into an HTTP status plus a plain message string;
/// the body is `{ "error": msg }` JSON. No retries happen here; the client
/// decides what to do with a failure.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Provider(#[from] ProviderError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Validation failure (empty input, missing file, bad payload).
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Inference failure from the chat executor.
    pub fn inference(err: genai::Error) -> Self {
        Self::Provider(ProviderError::from(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, msg) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            // Provider failures are relayed with the extracted message; the
            // endpoints reply 500 regardless of the upstream status.
            ApiError::Provider(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };
        let body = Json(serde_json::json!({ "error": msg }));
        (code, body).into_response()
    }
}

//! Image synthesis endpoint.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use nexus_provider::MediaClient;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct ImageBody {
    pub prompt: String,
}

/// `POST /api/generate-image`: returns the base64 image as a bare JSON
/// string, or `{ "error": msg }` with a non-200 status.
pub async fn generate_image(
    State(st): State<AppState>,
    Json(body): Json<ImageBody>,
) -> Result<Json<String>, ApiError> {
    if body.prompt.trim().is_empty() {
        return Err(ApiError::bad_request("prompt is empty"));
    }

    info!(model = %st.models.image_model, "generating image");
    let image = st
        .media
        .generate_image(&st.models.image_model, body.prompt.trim())
        .await?;

    Ok(Json(image.base64))
}

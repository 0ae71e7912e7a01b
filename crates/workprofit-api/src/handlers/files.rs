use axum::{
    extract::{Multipart, State},
    Json,
};
use std::sync::Arc;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::models::{ErrorResponse, UploadResponse};
use crate::storage::generated_name;
use crate::AppState;

/// Upload one file
///
/// Takes the part named `file`, or failing that the first part that carries
/// a filename. The blob is stored under a generated name and served from
/// `/static/`.
#[utoipa::path(
    post,
    path = "/api/v1/files/upload",
    request_body(content_type = "multipart/form-data", description = "Form with a `file` part"),
    responses(
        (status = 200, description = "File stored", body = UploadResponse),
        (status = 400, description = "No file in the form", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "files"
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let is_file_part = field.name() == Some("file");
        let original = match field.file_name() {
            Some(name) => name.to_string(),
            None if is_file_part => "upload".to_string(),
            None => continue,
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;

        let stored = generated_name(&original);
        state
            .blobs
            .put(&stored, &data)
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        info!("Stored upload {} as {} ({} bytes)", original, stored, data.len());
        return Ok(Json(UploadResponse {
            url: format!("/static/{}", stored),
            filename: original,
        }));
    }

    Err(ApiError::BadRequest("No file uploaded".to_string()))
}

use axum::extract::{Multipart, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::error::AppResult;
use crate::handlers::UploadForm;
use crate::middleware::auth::AuthOwner;
use crate::services::files::{store_upload, StoredFile};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadFileResponse {
    pub success: bool,
    #[serde(flatten)]
    pub file: StoredFile,
}

/// POST /api/v1/files/upload
///
/// Multipart `{file, originalName?}`. `originalName` overrides the name the
/// browser sent with the file part.
pub async fn upload_file(
    owner: AuthOwner,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<UploadFileResponse>> {
    let mut form = UploadForm::read(multipart).await?;
    let (part_name, bytes) = form.take_file()?;
    let original_name = form
        .field("originalName")
        .map(str::to_string)
        .unwrap_or(part_name);

    let file = store_upload(
        state.objects.as_ref(),
        owner.owner_id,
        &original_name,
        &bytes,
        Utc::now(),
    )
    .await?;

    Ok(Json(UploadFileResponse {
        success: true,
        file,
    }))
}

//! Attendance report handlers: upload, download, listing and deletion.

use axum::extract::{Multipart, Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use examhall_core::types::DbId;
use examhall_db::models::attendance::ReportWithDevice;
use serde::Serialize;

use crate::error::AppResult;
use crate::handlers::UploadForm;
use crate::middleware::auth::AuthOwner;
use crate::response::DataResponse;
use crate::services::reports::{self, ReportSummary};
use crate::state::AppState;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Serialize)]
pub struct UploadReportResponse {
    pub message: &'static str,
    pub data: ReportSummary,
}

/// POST /api/v1/attendance/upload
///
/// Multipart `{file, deviceIp}` carrying a roster spreadsheet.
pub async fn upload_report(
    owner: AuthOwner,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<UploadReportResponse>> {
    let mut form = UploadForm::read(multipart).await?;
    let (file_name, bytes) = form.take_file()?;

    let summary = reports::ingest(
        state.store.as_ref(),
        owner.owner_id,
        form.field("deviceIp"),
        &file_name,
        bytes,
        Utc::now(),
    )
    .await?;

    Ok(Json(UploadReportResponse {
        message: "Attendance report processed successfully",
        data: summary,
    }))
}

/// GET /api/v1/attendance/download/{report_id}
pub async fn download_report(
    owner: AuthOwner,
    State(state): State<AppState>,
    Path(report_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let exported = reports::export(state.store.as_ref(), owner.owner_id, report_id).await?;
    let disposition = format!("attachment; filename=\"{}\"", exported.file_name);

    Ok((
        [
            (CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        exported.bytes,
    ))
}

/// GET /api/v1/attendance/reports
pub async fn list_reports(
    owner: AuthOwner,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ReportWithDevice>>>> {
    let reports = reports::list(state.store.as_ref(), owner.owner_id).await?;
    Ok(Json(DataResponse { data: reports }))
}

/// DELETE /api/v1/attendance/reports/{id}
pub async fn delete_report(
    owner: AuthOwner,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    reports::delete(state.store.as_ref(), owner.owner_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

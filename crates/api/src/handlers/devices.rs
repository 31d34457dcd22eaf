//! Owner-facing device management handlers.

use std::collections::BTreeMap;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use examhall_core::types::DbId;
use examhall_db::models::device::{CreateDevice, Device, UpdateDevice};
use examhall_db::models::task::DeviceTask;
use serde::Serialize;

use crate::error::AppResult;
use crate::handlers::UploadForm;
use crate::middleware::auth::AuthOwner;
use crate::response::DataResponse;
use crate::services::devices::{self, DeviceWithStatus, ExamFileUpload};
use crate::services::tasks;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PendingCount {
    pub count: i64,
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/devices
pub async fn list_devices(
    owner: AuthOwner,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<DeviceWithStatus>>>> {
    let devices = devices::list(state.store.as_ref(), owner.owner_id, Utc::now()).await?;
    Ok(Json(DataResponse { data: devices }))
}

/// POST /api/v1/devices
pub async fn create_device(
    owner: AuthOwner,
    State(state): State<AppState>,
    Json(input): Json<CreateDevice>,
) -> AppResult<(StatusCode, Json<DataResponse<Device>>)> {
    let device = devices::create(state.store.as_ref(), owner.owner_id, input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: device })))
}

/// GET /api/v1/devices/{id}
pub async fn get_device(
    owner: AuthOwner,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<DeviceWithStatus>>> {
    let device = devices::get(state.store.as_ref(), owner.owner_id, id, Utc::now()).await?;
    Ok(Json(DataResponse { data: device }))
}

/// PUT /api/v1/devices/{id}
pub async fn update_device(
    owner: AuthOwner,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateDevice>,
) -> AppResult<Json<DataResponse<Device>>> {
    let device = devices::update(state.store.as_ref(), owner.owner_id, id, input).await?;
    Ok(Json(DataResponse { data: device }))
}

/// DELETE /api/v1/devices/{id}
pub async fn delete_device(
    owner: AuthOwner,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    devices::delete(state.store.as_ref(), owner.owner_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// GET /api/v1/devices/statuses
pub async fn device_statuses(
    owner: AuthOwner,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<BTreeMap<String, bool>>>> {
    let statuses = devices::statuses(state.store.as_ref(), owner.owner_id, Utc::now()).await?;
    Ok(Json(DataResponse { data: statuses }))
}

/// GET /api/v1/devices/{id}/pending-tasks
pub async fn pending_tasks(
    owner: AuthOwner,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PendingCount>>> {
    let count = tasks::pending_count(state.store.as_ref(), owner.owner_id, id).await?;
    Ok(Json(DataResponse {
        data: PendingCount { count },
    }))
}

// ---------------------------------------------------------------------------
// Exam files
// ---------------------------------------------------------------------------

/// POST /api/v1/devices/{id}/exam-file
///
/// Multipart `{file, startTime, endTime}`. Stores the file under its
/// scheduled name and queues an `upload_file` task for the device.
pub async fn upload_exam_file(
    owner: AuthOwner,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<DeviceTask>>)> {
    let mut form = UploadForm::read(multipart).await?;
    let (original_name, bytes) = form.take_file()?;

    let task = devices::schedule_exam_file(
        state.store.as_ref(),
        state.objects.as_ref(),
        owner.owner_id,
        id,
        ExamFileUpload {
            original_name,
            bytes,
            start_time: form.field("startTime").map(str::to_string),
            end_time: form.field("endTime").map(str::to_string),
        },
        Utc::now(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: task })))
}

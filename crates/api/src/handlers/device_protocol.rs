//! Endpoints spoken by the exam-room devices themselves.
//!
//! Heartbeat and poll are unauthenticated: a device identifies itself by
//! its IP address only. Bodies are flat camelCase JSON.

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use examhall_core::error::CoreError;
use examhall_core::types::{DbId, Timestamp};
use examhall_db::models::task::DeviceTask;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::auth::AuthOwner;
use crate::services::heartbeat::record_heartbeat;
use crate::services::tasks::{self, EnqueueTask};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    pub device_ip: Option<String>,
    pub status: Option<String>,
    pub device_info: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct HeartbeatResponse {
    pub success: bool,
    pub timestamp: Timestamp,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollQuery {
    pub device_ip: Option<String>,
}

/// Tasks keep their snake_case column names on the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub tasks: Vec<DeviceTask>,
    pub device_ip: String,
    pub timestamp: Timestamp,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusRequest {
    pub task_id: Option<String>,
    pub status: Option<String>,
    pub result: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueTaskRequest {
    pub device_ip: Option<String>,
    pub task_type: Option<String>,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub payload: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueTaskResponse {
    pub success: bool,
    pub task_id: DbId,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Device endpoints
// ---------------------------------------------------------------------------

/// POST /api/v1/devices/heartbeat
pub async fn heartbeat(
    State(state): State<AppState>,
    Json(input): Json<HeartbeatRequest>,
) -> AppResult<Json<HeartbeatResponse>> {
    let now = Utc::now();
    record_heartbeat(
        state.store.as_ref(),
        input.device_ip.as_deref(),
        input.status.as_deref(),
        input.device_info,
        now,
    )
    .await?;

    Ok(Json(HeartbeatResponse {
        success: true,
        timestamp: now,
    }))
}

/// GET /api/v1/devices/poll?deviceIp=
///
/// Counts as a heartbeat and returns up to five of the oldest pending tasks.
pub async fn poll(
    State(state): State<AppState>,
    Query(query): Query<PollQuery>,
) -> AppResult<Json<PollResponse>> {
    let now = Utc::now();
    let device_ip = query.device_ip.unwrap_or_default();
    let tasks = tasks::poll_pending(state.store.as_ref(), Some(&device_ip), now).await?;

    Ok(Json(PollResponse {
        tasks,
        device_ip: device_ip.trim().to_string(),
        timestamp: now,
    }))
}

/// POST /api/v1/devices/poll
///
/// A device reporting the outcome of a task.
pub async fn report_task_status(
    State(state): State<AppState>,
    Json(input): Json<TaskStatusRequest>,
) -> AppResult<Json<SuccessResponse>> {
    let (Some(task_id), Some(status)) = (input.task_id, input.status) else {
        return Err(CoreError::Validation("Task ID and status are required".into()).into());
    };
    let task_id: DbId = task_id
        .trim()
        .parse()
        .map_err(|_| CoreError::Validation(format!("Task ID '{task_id}' is not a valid id")))?;

    tasks::report_status(state.store.as_ref(), task_id, &status, input.result, Utc::now())
        .await?;

    Ok(Json(SuccessResponse { success: true }))
}

// ---------------------------------------------------------------------------
// Owner endpoint
// ---------------------------------------------------------------------------

/// POST /api/v1/devices/queue-task
pub async fn queue_task(
    owner: AuthOwner,
    State(state): State<AppState>,
    Json(input): Json<QueueTaskRequest>,
) -> AppResult<Json<QueueTaskResponse>> {
    let task = tasks::enqueue(
        state.store.as_ref(),
        owner.owner_id,
        EnqueueTask {
            device_ip: input.device_ip,
            task_type: input.task_type,
            file_url: input.file_url,
            file_name: input.file_name,
            payload: input.payload,
        },
    )
    .await?;

    Ok(Json(QueueTaskResponse {
        success: true,
        task_id: task.id,
        message: format!("Task queued for device {}", task.device_ip),
    }))
}

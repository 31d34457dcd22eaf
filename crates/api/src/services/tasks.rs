//! The device task queue: owner-side enqueue, device-side poll and report.

use examhall_core::devices::require_device_ip;
use examhall_core::error::CoreError;
use examhall_core::task_queue::{
    completion_payload, validate_reported_status, validate_task_type, HEARTBEAT_STATUS_ONLINE,
    POLL_BATCH_LIMIT,
};
use examhall_core::types::{DbId, Timestamp};
use examhall_db::models::heartbeat::TouchHeartbeat;
use examhall_db::models::task::{CompleteTask, CreateTask, DeviceTask};
use examhall_db::FleetStore;

use crate::error::AppResult;

/// A task as requested by a device owner.
#[derive(Debug, Clone, Default)]
pub struct EnqueueTask {
    pub device_ip: Option<String>,
    pub task_type: Option<String>,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub payload: Option<serde_json::Value>,
}

/// Queue a task for a device the caller owns.
///
/// Fails with `Validation` when the IP or task type is missing and with
/// `NotFound` when none of the caller's devices has that IP.
pub async fn enqueue(
    store: &dyn FleetStore,
    owner_id: DbId,
    input: EnqueueTask,
) -> AppResult<DeviceTask> {
    let device_ip = require_device_ip(input.device_ip.as_deref())?;
    let task_type = input.task_type.as_deref().unwrap_or("").trim();
    validate_task_type(task_type)?;

    store
        .find_device_by_ip(owner_id, device_ip)
        .await?
        .ok_or_else(|| CoreError::not_found("Device", device_ip))?;

    let task = store
        .create_task(&CreateTask {
            device_ip: device_ip.to_string(),
            task_type: task_type.to_string(),
            file_url: input.file_url,
            file_name: input.file_name,
            payload: input.payload.unwrap_or_else(|| serde_json::json!({})),
        })
        .await?;

    tracing::info!(
        task_id = %task.id,
        device_ip = %task.device_ip,
        task_type = %task.task_type,
        owner_id = %owner_id,
        "Task queued",
    );
    Ok(task)
}

/// Hand a device its oldest pending tasks.
///
/// Polling counts as a heartbeat: `last_seen` and `status` are refreshed,
/// the `device_info` from the last explicit heartbeat is kept, and a failed
/// write is logged without failing the poll. Returned tasks stay `pending`,
/// so each is delivered again on every poll until the device reports a
/// status for it.
pub async fn poll_pending(
    store: &dyn FleetStore,
    device_ip: Option<&str>,
    now: Timestamp,
) -> AppResult<Vec<DeviceTask>> {
    let device_ip = require_device_ip(device_ip)?;
    let touch = TouchHeartbeat {
        device_ip: device_ip.to_string(),
        last_seen: now,
        status: HEARTBEAT_STATUS_ONLINE.to_string(),
    };
    if let Err(e) = store.touch_heartbeat(&touch).await {
        tracing::warn!(device_ip, error = %e, "Poll heartbeat not recorded");
    }

    let tasks = store.list_pending_tasks(device_ip, POLL_BATCH_LIMIT).await?;
    if !tasks.is_empty() {
        tracing::debug!(device_ip, count = tasks.len(), "Delivering pending tasks");
    }
    Ok(tasks)
}

/// Record the status a device reports for one of its tasks.
///
/// Any status except `pending` is accepted and stamps `completed_at`. The
/// device's result, if any, is stored as `{"result": ...}`; otherwise the
/// payload is cleared.
pub async fn report_status(
    store: &dyn FleetStore,
    task_id: DbId,
    status: &str,
    result: Option<serde_json::Value>,
    now: Timestamp,
) -> AppResult<DeviceTask> {
    validate_reported_status(status)?;

    let task = store
        .complete_task(
            task_id,
            &CompleteTask {
                status: status.trim().to_string(),
                payload: completion_payload(result),
                completed_at: now,
            },
        )
        .await?
        .ok_or_else(|| CoreError::not_found("Task", task_id))?;

    tracing::info!(task_id = %task.id, device_ip = %task.device_ip, status = %task.status, "Task status reported");
    Ok(task)
}

/// Pending-task count for one of the caller's devices.
pub async fn pending_count(store: &dyn FleetStore, owner_id: DbId, device_id: DbId) -> AppResult<i64> {
    let device = store
        .find_device(owner_id, device_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Device", device_id))?;
    Ok(store.count_pending_tasks(&device.ip_address).await?)
}

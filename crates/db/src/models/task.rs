//! Device task queue models.

use serde::Serialize;
use sqlx::FromRow;
use examhall_core::types::{DbId, Timestamp};

/// A row from the `device_tasks` table.
///
/// Serialized with its column names; devices read this shape directly.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DeviceTask {
    pub id: DbId,
    pub device_ip: String,
    pub task_type: String,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub payload: Option<serde_json::Value>,
    pub status: String,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

/// DTO for enqueueing a task. Status always starts as `pending`.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub device_ip: String,
    pub task_type: String,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub payload: serde_json::Value,
}

/// DTO for recording the status a device reported for a task.
#[derive(Debug, Clone)]
pub struct CompleteTask {
    pub status: String,
    pub payload: Option<serde_json::Value>,
    pub completed_at: Timestamp,
}

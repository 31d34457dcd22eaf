//! Repository for the `device_tasks` table.

use sqlx::PgPool;
use examhall_core::task_queue::TASK_STATUS_PENDING;
use examhall_core::types::DbId;

use crate::models::task::{CompleteTask, CreateTask, DeviceTask};

/// Column list for `device_tasks` queries.
const COLUMNS: &str = "\
    id, device_ip, task_type, file_url, file_name, payload, status, \
    created_at, completed_at";

pub struct TaskRepo;

impl TaskRepo {
    /// Enqueue a task in the `pending` state.
    pub async fn create(pool: &PgPool, input: &CreateTask) -> Result<DeviceTask, sqlx::Error> {
        let query = format!(
            "INSERT INTO device_tasks (device_ip, task_type, file_url, file_name, payload, status)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DeviceTask>(&query)
            .bind(&input.device_ip)
            .bind(&input.task_type)
            .bind(&input.file_url)
            .bind(&input.file_name)
            .bind(&input.payload)
            .bind(TASK_STATUS_PENDING)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<DeviceTask>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM device_tasks WHERE id = $1");
        sqlx::query_as::<_, DeviceTask>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Oldest pending tasks for an IP, at most `limit`, ties in insertion
    /// order. Status is left alone.
    pub async fn list_pending(
        pool: &PgPool,
        device_ip: &str,
        limit: i64,
    ) -> Result<Vec<DeviceTask>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM device_tasks \
             WHERE device_ip = $1 AND status = $2 \
             ORDER BY created_at ASC, seq ASC \
             LIMIT $3"
        );
        sqlx::query_as::<_, DeviceTask>(&query)
            .bind(device_ip)
            .bind(TASK_STATUS_PENDING)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    pub async fn count_pending(pool: &PgPool, device_ip: &str) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM device_tasks WHERE device_ip = $1 AND status = $2",
        )
        .bind(device_ip)
        .bind(TASK_STATUS_PENDING)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Record a reported status. Returns `None` for an unknown task.
    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        input: &CompleteTask,
    ) -> Result<Option<DeviceTask>, sqlx::Error> {
        let query = format!(
            "UPDATE device_tasks SET
                status = $2,
                payload = $3,
                completed_at = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DeviceTask>(&query)
            .bind(id)
            .bind(&input.status)
            .bind(&input.payload)
            .bind(input.completed_at)
            .fetch_optional(pool)
            .await
    }
}

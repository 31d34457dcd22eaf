//! Repository for the `devices` table.
//!
//! Every query is scoped to the owning user: a device belonging to someone
//! else is indistinguishable from a missing one.

use sqlx::PgPool;
use examhall_core::types::DbId;

use crate::models::device::{CreateDevice, Device, UpdateDevice};

/// Column list for `devices` queries.
const COLUMNS: &str = "id, name, ip_address, owner_id, created_at, updated_at";

/// Provides owner-scoped CRUD operations for devices.
pub struct DeviceRepo;

impl DeviceRepo {
    /// List an owner's devices, newest first.
    pub async fn list_for_owner(pool: &PgPool, owner_id: DbId) -> Result<Vec<Device>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM devices WHERE owner_id = $1 ORDER BY created_at DESC, id"
        );
        sqlx::query_as::<_, Device>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_for_owner(
        pool: &PgPool,
        owner_id: DbId,
        id: DbId,
    ) -> Result<Option<Device>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM devices WHERE id = $1 AND owner_id = $2");
        sqlx::query_as::<_, Device>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    /// Find the owner's device registered under `ip_address`.
    pub async fn find_by_ip_for_owner(
        pool: &PgPool,
        owner_id: DbId,
        ip_address: &str,
    ) -> Result<Option<Device>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM devices WHERE ip_address = $1 AND owner_id = $2");
        sqlx::query_as::<_, Device>(&query)
            .bind(ip_address)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateDevice,
    ) -> Result<Device, sqlx::Error> {
        let query = format!(
            "INSERT INTO devices (name, ip_address, owner_id) VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Device>(&query)
            .bind(&input.name)
            .bind(&input.ip_address)
            .bind(owner_id)
            .fetch_one(pool)
            .await
    }

    /// Update a device. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        owner_id: DbId,
        id: DbId,
        input: &UpdateDevice,
    ) -> Result<Option<Device>, sqlx::Error> {
        let query = format!(
            "UPDATE devices SET
                name = COALESCE($3, name),
                ip_address = COALESCE($4, ip_address),
                updated_at = NOW()
             WHERE id = $1 AND owner_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Device>(&query)
            .bind(id)
            .bind(owner_id)
            .bind(&input.name)
            .bind(&input.ip_address)
            .fetch_optional(pool)
            .await
    }

    /// Delete a device and, through the foreign key, its reports.
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, owner_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM devices WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

//! Repository for the `device_heartbeats` table.

use sqlx::PgPool;

use crate::models::heartbeat::{DeviceHeartbeat, TouchHeartbeat, UpsertHeartbeat};

/// Column list for `device_heartbeats` queries.
const COLUMNS: &str = "device_ip, last_seen, status, device_info";

pub struct HeartbeatRepo;

impl HeartbeatRepo {
    /// Insert or overwrite the heartbeat row for an IP.
    ///
    /// No ordering check is made: a late heartbeat can move `last_seen`
    /// backwards.
    pub async fn upsert(
        pool: &PgPool,
        input: &UpsertHeartbeat,
    ) -> Result<DeviceHeartbeat, sqlx::Error> {
        let query = format!(
            "INSERT INTO device_heartbeats (device_ip, last_seen, status, device_info)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (device_ip) DO UPDATE SET
                last_seen = EXCLUDED.last_seen,
                status = EXCLUDED.status,
                device_info = EXCLUDED.device_info
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DeviceHeartbeat>(&query)
            .bind(&input.device_ip)
            .bind(input.last_seen)
            .bind(&input.status)
            .bind(&input.device_info)
            .fetch_one(pool)
            .await
    }

    /// Refresh `last_seen` and `status`, creating the row with empty
    /// `device_info` if the IP has none.
    pub async fn touch(
        pool: &PgPool,
        input: &TouchHeartbeat,
    ) -> Result<DeviceHeartbeat, sqlx::Error> {
        let query = format!(
            "INSERT INTO device_heartbeats (device_ip, last_seen, status, device_info)
             VALUES ($1, $2, $3, '{{}}'::jsonb)
             ON CONFLICT (device_ip) DO UPDATE SET
                last_seen = EXCLUDED.last_seen,
                status = EXCLUDED.status
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DeviceHeartbeat>(&query)
            .bind(&input.device_ip)
            .bind(input.last_seen)
            .bind(&input.status)
            .fetch_one(pool)
            .await
    }

    pub async fn find(pool: &PgPool, device_ip: &str) -> Result<Option<DeviceHeartbeat>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM device_heartbeats WHERE device_ip = $1");
        sqlx::query_as::<_, DeviceHeartbeat>(&query)
            .bind(device_ip)
            .fetch_optional(pool)
            .await
    }

    /// Fetch the heartbeat rows that exist for any of `device_ips`.
    pub async fn list_for_ips(
        pool: &PgPool,
        device_ips: &[String],
    ) -> Result<Vec<DeviceHeartbeat>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM device_heartbeats WHERE device_ip = ANY($1)");
        sqlx::query_as::<_, DeviceHeartbeat>(&query)
            .bind(device_ips)
            .fetch_all(pool)
            .await
    }
}

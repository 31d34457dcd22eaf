//! Device heartbeat models.

use serde::Serialize;
use sqlx::FromRow;
use examhall_core::types::Timestamp;

/// A row from the `device_heartbeats` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DeviceHeartbeat {
    pub device_ip: String,
    pub last_seen: Timestamp,
    pub status: String,
    pub device_info: serde_json::Value,
}

/// DTO for upserting the heartbeat row of one IP.
#[derive(Debug, Clone)]
pub struct UpsertHeartbeat {
    pub device_ip: String,
    pub last_seen: Timestamp,
    pub status: String,
    pub device_info: serde_json::Value,
}

/// DTO for refreshing liveness only; an existing row keeps its
/// `device_info`.
#[derive(Debug, Clone)]
pub struct TouchHeartbeat {
    pub device_ip: String,
    pub last_seen: Timestamp,
    pub status: String,
}

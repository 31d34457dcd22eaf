//! Device entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use examhall_core::types::{DbId, Timestamp};

/// A row from the `devices` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Device {
    pub id: DbId,
    pub name: String,
    pub ip_address: String,
    pub owner_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for registering a device.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDevice {
    pub name: String,
    pub ip_address: String,
}

/// DTO for renaming or re-addressing a device. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDevice {
    pub name: Option<String>,
    pub ip_address: Option<String>,
}

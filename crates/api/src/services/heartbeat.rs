//! Heartbeat recording.

use examhall_core::devices::require_device_ip;
use examhall_core::task_queue::HEARTBEAT_STATUS_ONLINE;
use examhall_core::types::Timestamp;
use examhall_db::models::heartbeat::{DeviceHeartbeat, UpsertHeartbeat};
use examhall_db::FleetStore;

use crate::error::AppResult;

/// Upsert the heartbeat row for `device_ip` with `last_seen = now`.
///
/// `status` defaults to `online` and `device_info` to `{}`. Any previous row
/// is overwritten unconditionally.
pub async fn record_heartbeat(
    store: &dyn FleetStore,
    device_ip: Option<&str>,
    status: Option<&str>,
    device_info: Option<serde_json::Value>,
    now: Timestamp,
) -> AppResult<DeviceHeartbeat> {
    let device_ip = require_device_ip(device_ip)?;
    let status = status
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(HEARTBEAT_STATUS_ONLINE);

    let row = store
        .upsert_heartbeat(&UpsertHeartbeat {
            device_ip: device_ip.to_string(),
            last_seen: now,
            status: status.to_string(),
            device_info: device_info.unwrap_or_else(|| serde_json::json!({})),
        })
        .await?;

    tracing::debug!(device_ip = %row.device_ip, status = %row.status, "Heartbeat recorded");
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use examhall_core::error::CoreError;
    use examhall_db::MemoryStore;

    use crate::error::AppError;

    #[tokio::test]
    async fn defaults_status_and_info() {
        let store = MemoryStore::new();
        let row = record_heartbeat(&store, Some("10.0.0.1"), None, None, Utc::now())
            .await
            .unwrap();
        assert_eq!(row.status, "online");
        assert_eq!(row.device_info, serde_json::json!({}));
    }

    #[tokio::test]
    async fn missing_ip_is_validation_error() {
        let store = MemoryStore::new();
        let result = record_heartbeat(&store, Some("  "), None, None, Utc::now()).await;
        assert_matches!(result, Err(AppError::Core(CoreError::Validation(_))));
        let result = record_heartbeat(&store, None, None, None, Utc::now()).await;
        assert_matches!(result, Err(AppError::Core(CoreError::Validation(_))));
    }
}

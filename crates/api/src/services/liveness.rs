//! Online/offline evaluation from heartbeat rows.
//!
//! Both lookups fail closed: if the store cannot be read, devices are
//! reported offline rather than surfacing an error.

use std::collections::BTreeMap;

use examhall_core::liveness::{fold_statuses, is_within_window};
use examhall_core::types::Timestamp;
use examhall_db::FleetStore;

/// Whether `device_ip` has been seen within the liveness window.
pub async fn is_online(store: &dyn FleetStore, device_ip: &str, now: Timestamp) -> bool {
    match store.find_heartbeat(device_ip).await {
        Ok(Some(row)) => is_within_window(row.last_seen, now),
        Ok(None) => false,
        Err(e) => {
            tracing::warn!(device_ip, error = %e, "Heartbeat lookup failed; reporting offline");
            false
        }
    }
}

/// Online flag for every requested IP; IPs without a heartbeat are offline.
pub async fn get_statuses(
    store: &dyn FleetStore,
    device_ips: &[String],
    now: Timestamp,
) -> BTreeMap<String, bool> {
    let requested = device_ips.iter().map(String::as_str);
    match store.list_heartbeats(device_ips).await {
        Ok(rows) => fold_statuses(
            requested,
            rows.iter().map(|r| (r.device_ip.as_str(), r.last_seen)),
            now,
        ),
        Err(e) => {
            tracing::warn!(count = device_ips.len(), error = %e, "Heartbeat lookup failed; reporting all offline");
            fold_statuses(requested, std::iter::empty(), now)
        }
    }
}

//! Heartbeat liveness window.
//!
//! A device is online when its last heartbeat (or poll) is no older than
//! [`LIVENESS_WINDOW_SECS`]. All comparisons are done on UTC instants.

use std::collections::BTreeMap;

use chrono::Duration;

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// A device that has not been seen for longer than this is offline.
pub const LIVENESS_WINDOW_SECS: i64 = 120;

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Whether a device last seen at `last_seen` counts as online at `now`.
///
/// The window is inclusive: exactly two minutes of silence is still online.
/// A `last_seen` in the future (clock skew) is treated as online.
pub fn is_within_window(last_seen: Timestamp, now: Timestamp) -> bool {
    now.signed_duration_since(last_seen) <= Duration::seconds(LIVENESS_WINDOW_SECS)
}

/// Build the online/offline map for `requested` IPs.
///
/// Every requested IP starts out offline; only heartbeats for requested IPs
/// are applied, so the result always has exactly one entry per distinct
/// requested IP.
pub fn fold_statuses<'a, I, H>(requested: I, heartbeats: H, now: Timestamp) -> BTreeMap<String, bool>
where
    I: IntoIterator<Item = &'a str>,
    H: IntoIterator<Item = (&'a str, Timestamp)>,
{
    let mut statuses: BTreeMap<String, bool> = requested
        .into_iter()
        .map(|ip| (ip.to_string(), false))
        .collect();

    for (ip, last_seen) in heartbeats {
        if let Some(online) = statuses.get_mut(ip) {
            *online = is_within_window(last_seen, now);
        }
    }

    statuses
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Device task queue constants and status rules.
//!
//! Tasks are addressed by device IP and delivered by polling. Delivery is
//! at-least-once: a task stays `pending` and is handed out on every poll until
//! the device reports a terminal status for it. Consumers must therefore
//! treat a redelivered task id they already processed as a no-op.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum number of tasks handed to a device per poll.
pub const POLL_BATCH_LIMIT: i64 = 5;

/// Initial status of every queued task.
pub const TASK_STATUS_PENDING: &str = "pending";

/// Conventional success status reported by devices.
pub const TASK_STATUS_COMPLETED: &str = "completed";

/// Conventional failure status reported by devices.
pub const TASK_STATUS_FAILED: &str = "failed";

/// Task type instructing a device to download a scheduled exam file.
pub const TASK_TYPE_UPLOAD_FILE: &str = "upload_file";

/// Heartbeat status recorded when a device polls or omits a status.
pub const HEARTBEAT_STATUS_ONLINE: &str = "online";

/// Maximum length of a task type identifier.
const MAX_TASK_TYPE_LEN: usize = 64;

/// Maximum length of a reported task status.
const MAX_STATUS_LEN: usize = 32;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a task type supplied when enqueueing.
pub fn validate_task_type(task_type: &str) -> Result<(), CoreError> {
    if task_type.trim().is_empty() {
        return Err(CoreError::Validation("Task type is required".to_string()));
    }
    if task_type.len() > MAX_TASK_TYPE_LEN {
        return Err(CoreError::Validation(format!(
            "Task type must not exceed {MAX_TASK_TYPE_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a status reported by a device for one of its tasks.
///
/// Any non-empty string is accepted as the terminal write except `pending`:
/// a report can never put a task back on the queue.
pub fn validate_reported_status(status: &str) -> Result<(), CoreError> {
    let status = status.trim();
    if status.is_empty() {
        return Err(CoreError::Validation("Task status is required".to_string()));
    }
    if status.len() > MAX_STATUS_LEN {
        return Err(CoreError::Validation(format!(
            "Task status must not exceed {MAX_STATUS_LEN} characters"
        )));
    }
    if status.eq_ignore_ascii_case(TASK_STATUS_PENDING) {
        return Err(CoreError::Validation(
            "A task cannot be reported back to 'pending'".to_string(),
        ));
    }
    Ok(())
}

/// Payload stored on a task when its status is reported.
///
/// The device's result is wrapped as `{"result": ...}`; without a result the
/// payload is cleared.
pub fn completion_payload(result: Option<serde_json::Value>) -> Option<serde_json::Value> {
    result.map(|result| serde_json::json!({ "result": result }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn upload_task_type_is_valid() {
        assert!(validate_task_type(TASK_TYPE_UPLOAD_FILE).is_ok());
    }

    #[test]
    fn empty_task_type_rejected() {
        assert_matches!(validate_task_type(""), Err(CoreError::Validation(_)));
    }

    #[test]
    fn oversized_task_type_rejected() {
        assert!(validate_task_type(&"t".repeat(MAX_TASK_TYPE_LEN + 1)).is_err());
    }

    #[test]
    fn terminal_statuses_accepted() {
        assert!(validate_reported_status(TASK_STATUS_COMPLETED).is_ok());
        assert!(validate_reported_status(TASK_STATUS_FAILED).is_ok());
        assert!(validate_reported_status("skipped").is_ok());
    }

    #[test]
    fn reopening_rejected() {
        assert_matches!(
            validate_reported_status("Pending"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn blank_status_rejected() {
        assert!(validate_reported_status("  ").is_err());
    }

    #[test]
    fn result_is_wrapped() {
        let payload = completion_payload(Some(serde_json::json!("saved"))).unwrap();
        assert_eq!(payload, serde_json::json!({ "result": "saved" }));
    }

    #[test]
    fn missing_result_clears_payload() {
        assert!(completion_payload(None).is_none());
    }
}

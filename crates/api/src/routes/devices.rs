//! Route definitions for devices and the device protocol.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{device_protocol, devices};
use crate::state::AppState;

/// Device routes mounted at `/devices`.
///
/// ```text
/// POST   /heartbeat              -> heartbeat
/// GET    /poll                   -> poll
/// POST   /poll                   -> report_task_status
/// POST   /queue-task             -> queue_task
/// GET    /                       -> list_devices
/// POST   /                       -> create_device
/// GET    /statuses               -> device_statuses
/// GET    /{id}                   -> get_device
/// PUT    /{id}                   -> update_device
/// DELETE /{id}                   -> delete_device
/// GET    /{id}/pending-tasks     -> pending_tasks
/// POST   /{id}/exam-file         -> upload_exam_file
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/heartbeat", post(device_protocol::heartbeat))
        .route(
            "/poll",
            get(device_protocol::poll).post(device_protocol::report_task_status),
        )
        .route("/queue-task", post(device_protocol::queue_task))
        .route("/", get(devices::list_devices).post(devices::create_device))
        .route("/statuses", get(devices::device_statuses))
        .route(
            "/{id}",
            get(devices::get_device)
                .put(devices::update_device)
                .delete(devices::delete_device),
        )
        .route("/{id}/pending-tasks", get(devices::pending_tasks))
        .route("/{id}/exam-file", post(devices::upload_exam_file))
}

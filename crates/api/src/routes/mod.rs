pub mod attendance;
pub mod devices;
pub mod files;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /devices/heartbeat                               heartbeat (device, public)
/// /devices/poll                                    fetch tasks (GET), report status (POST) (device, public)
/// /devices/queue-task                              enqueue a task (POST)
///
/// /devices                                         list, register
/// /devices/statuses                                online flag per owned IP
/// /devices/{id}                                    get, update, delete
/// /devices/{id}/pending-tasks                      pending task count
/// /devices/{id}/exam-file                          schedule an exam file (POST, multipart)
///
/// /attendance/upload                               ingest a roster (POST, multipart)
/// /attendance/download/{report_id}                 export a report as xlsx
/// /attendance/reports                              list
/// /attendance/reports/{id}                         delete
///
/// /files/upload                                    store a file (POST, multipart)
/// ```
///
/// Everything except the device heartbeat and poll requires a bearer token.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/devices", devices::router())
        .nest("/attendance", attendance::router())
        .nest("/files", files::router())
}

//! Route definitions for attendance reports.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::attendance;
use crate::state::AppState;

/// Attendance routes mounted at `/attendance`.
///
/// ```text
/// POST   /upload                  -> upload_report
/// GET    /download/{report_id}    -> download_report
/// GET    /reports                 -> list_reports
/// DELETE /reports/{id}            -> delete_report
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(attendance::upload_report))
        .route("/download/{report_id}", get(attendance::download_report))
        .route("/reports", get(attendance::list_reports))
        .route("/reports/{id}", delete(attendance::delete_report))
}

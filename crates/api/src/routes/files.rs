use axum::routing::post;
use axum::Router;

use crate::handlers::files;
use crate::state::AppState;

/// File routes mounted at `/files`.
///
/// ```text
/// POST /upload -> upload_file
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/upload", post(files::upload_file))
}

//! Shared response envelope types for API handlers.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope, used by the owner-facing API.
///
/// The device protocol endpoints answer with flat bodies instead, since
/// deployed devices parse those shapes directly.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

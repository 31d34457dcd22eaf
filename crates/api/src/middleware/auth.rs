//! Bearer-token extractor for the owner-facing API.
//!
//! Devices, tasks and reports are scoped to the account that owns them; the
//! account id is the token's `sub`.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use examhall_core::error::CoreError;
use examhall_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// The account on whose behalf an owner endpoint runs.
///
/// ```ignore
/// async fn list(owner: AuthOwner, State(state): State<AppState>) -> AppResult<Json<..>> {
///     let devices = state.store.list_devices(owner.owner_id).await?;
///     ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthOwner {
    /// Owner of every device and report the request may touch.
    pub owner_id: DbId,
    /// Role name issued by the identity provider.
    pub role: String,
}

/// The token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Result<&str, CoreError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| CoreError::Unauthorized("Missing Authorization header".into()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            CoreError::Unauthorized("Invalid Authorization format. Expected: Bearer <token>".into())
        })
}

impl FromRequestParts<AppState> for AuthOwner {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;

        let claims = validate_token(token, &state.config.jwt).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            CoreError::Unauthorized("Invalid or expired token".into())
        })?;

        Ok(AuthOwner {
            owner_id: claims.sub,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_extracted() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")).unwrap(), "abc.def");
    }

    #[test]
    fn missing_header_is_unauthorized() {
        assert_matches!(
            bearer_token(&HeaderMap::new()),
            Err(CoreError::Unauthorized(msg)) if msg.contains("Missing")
        );
    }

    #[test]
    fn wrong_scheme_or_empty_token_is_unauthorized() {
        assert_matches!(bearer_token(&headers("Basic abc")), Err(CoreError::Unauthorized(_)));
        assert_matches!(bearer_token(&headers("Bearer  ")), Err(CoreError::Unauthorized(_)));
    }
}

//! Custom Axum extractors

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::error::ApiError;
use super::server::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The acting user: the `X-User-Id` header, or the configured default.
///
/// Resolving the id to a user is left to the services, which answer
/// `CURRENT_USER_REQUIRED` or `USER_NOT_FOUND`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUserId(pub Option<String>);

impl CurrentUserId {
    #[must_use]
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl FromRequestParts<Arc<AppState>> for CurrentUserId {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = match parts.headers.get(USER_ID_HEADER) {
            Some(value) => Some(
                value
                    .to_str()
                    .map_err(|_| ApiError::bad_request("X-User-Id must be visible ASCII"))?
                    .trim()
                    .to_string(),
            ),
            None => None,
        };

        Ok(Self(
            header
                .filter(|id| !id.is_empty())
                .or_else(|| state.default_user.clone()),
        ))
    }
}

//! Request-scoped identity of the caller.
//!
//! Authentication happens upstream. By the time a request reaches this API
//! the login layer has put the authenticated user id in [`USER_HEADER`]. The
//! id must still name an existing user; anything else is unauthenticated.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use churn_core::{UserId, store::TenantStore};
use tracing::debug;

use crate::error::ApiError;

pub const USER_HEADER: &str = "x-user-id";

/// The authenticated caller. Present in a handler means the header was valid
/// and the user exists.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserId);

impl<S> FromRequestParts<Arc<S>> for CurrentUser
where
  S: TenantStore,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    store: &Arc<S>,
  ) -> Result<Self, Self::Rejection> {
    let raw = parts
      .headers
      .get(USER_HEADER)
      .and_then(|v| v.to_str().ok())
      .ok_or(ApiError::Unauthenticated)?;
    let user_id: UserId = raw.parse()?;

    if store
      .get_user(user_id)
      .await
      .map_err(ApiError::store)?
      .is_none()
    {
      debug!(%user_id, "unknown user");
      return Err(ApiError::Unauthenticated);
    }
    Ok(CurrentUser(user_id))
  }
}

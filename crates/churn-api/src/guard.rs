//! Permission gates shared by every handler.

use churn_core::{
  AccessLevel, AccessResolver, Action, CohortId, ContactId, StreamId, UserId,
  cohort::Cohort,
  contact::Contact,
  store::{AccessStore, TenantStore},
};
use tracing::debug;

use crate::error::ApiError;

/// Resolve the caller's level on `stream_id` and require `action`.
///
/// A caller without any access gets [`ApiError::NotFound`]; one who can see
/// the stream but not act on it gets [`ApiError::Forbidden`].
pub async fn require<S: AccessStore>(
  store: &S,
  user_id: UserId,
  stream_id: StreamId,
  action: Action,
) -> Result<AccessLevel, ApiError> {
  let (level, allowed) = AccessResolver::new(store)
    .check(user_id, stream_id, action)
    .await?;
  if allowed {
    return Ok(level);
  }
  debug!(%user_id, %stream_id, %action, %level, "denied");
  if level.can_view() {
    Err(ApiError::Forbidden(format!("{action} is not permitted with {level} access")))
  } else {
    Err(ApiError::NotFound)
  }
}

/// Load a contact and require `action` on its stream.
pub async fn contact<S: TenantStore>(
  store: &S,
  user_id: UserId,
  contact_id: ContactId,
  action: Action,
) -> Result<(Contact, AccessLevel), ApiError> {
  let contact = store
    .get_contact(contact_id)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::NotFound)?;
  let level = require(store, user_id, contact.stream_id, action).await?;
  Ok((contact, level))
}

/// Load a cohort and require `action` on its stream.
pub async fn cohort<S: TenantStore>(
  store: &S,
  user_id: UserId,
  cohort_id: CohortId,
  action: Action,
) -> Result<(Cohort, AccessLevel), ApiError> {
  let cohort = store
    .get_cohort(cohort_id)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::NotFound)?;
  let level = require(store, user_id, cohort.stream_id, action).await?;
  Ok((cohort, level))
}

/// Trim a required text field, rejecting blanks.
pub fn non_blank(field: &str, value: String) -> Result<String, ApiError> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(ApiError::BadRequest(format!("{field} must not be empty")));
  }
  Ok(trimmed.to_owned())
}

//! Handlers for `/cohorts` endpoints.
//!
//! | Method   | Path                              | Gate                       |
//! |----------|-----------------------------------|----------------------------|
//! | `GET`    | `/cohorts`                        | `?stream_id=`; scoped      |
//! | `POST`   | `/cohorts`                        | add                        |
//! | `GET`    | `/cohorts/{id}`                   | view                       |
//! | `DELETE` | `/cohorts/{id}`                   | delete                     |
//! | `GET`    | `/cohorts/{id}/members`           | view                       |
//! | `PUT`    | `/cohorts/{id}/members/{contact}` | add; same stream only      |
//! | `DELETE` | `/cohorts/{id}/members/{contact}` | edit                       |

use std::{collections::BTreeSet, sync::Arc};

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use churn_core::{
  AccessResolver, Action, CohortId, ContactId, StreamId,
  cohort::{Cohort, CohortMember, NewCohort},
  contact::Contact,
  store::TenantStore,
};
use serde::Deserialize;
use tracing::info;

use crate::{
  auth::CurrentUser,
  error::ApiError,
  guard::{self, non_blank, require},
};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub stream_id: Option<StreamId>,
}

/// `GET /cohorts[?stream_id=<id>]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Cohort>>, ApiError>
where
  S: TenantStore,
{
  let stream_ids = match params.stream_id {
    Some(stream_id) => {
      require(store.as_ref(), user_id, stream_id, Action::View).await?;
      BTreeSet::from([stream_id])
    }
    None => {
      AccessResolver::new(store.as_ref())
        .list_accessible_stream_ids(user_id)
        .await?
    }
  };
  let cohorts = store
    .list_cohorts(&stream_ids)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(cohorts))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub stream_id:   StreamId,
  pub name:        String,
  pub description: Option<String>,
}

/// `POST /cohorts`: body: `{"stream_id":1,"name":"..."}`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TenantStore,
{
  let name = non_blank("name", body.name)?;
  require(store.as_ref(), user_id, body.stream_id, Action::Add).await?;

  let cohort = store
    .add_cohort(NewCohort {
      stream_id: body.stream_id,
      name,
      description: body
        .description
        .map(|d| d.trim().to_owned())
        .filter(|d| !d.is_empty()),
      created_by: user_id,
    })
    .await
    .map_err(ApiError::store)?;
  info!(%user_id, cohort_id = %cohort.cohort_id, "cohort created");
  Ok((StatusCode::CREATED, Json(cohort)))
}

// ─── Get / delete ─────────────────────────────────────────────────────────────

/// `GET /cohorts/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(cohort_id): Path<CohortId>,
) -> Result<Json<Cohort>, ApiError>
where
  S: TenantStore,
{
  let (cohort, _) =
    guard::cohort(store.as_ref(), user_id, cohort_id, Action::View).await?;
  Ok(Json(cohort))
}

/// `DELETE /cohorts/{id}`: member contacts are kept.
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(cohort_id): Path<CohortId>,
) -> Result<StatusCode, ApiError>
where
  S: TenantStore,
{
  guard::cohort(store.as_ref(), user_id, cohort_id, Action::Delete).await?;
  if !store
    .delete_cohort(cohort_id)
    .await
    .map_err(ApiError::store)?
  {
    return Err(ApiError::NotFound);
  }
  info!(%user_id, %cohort_id, "cohort deleted");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Members ──────────────────────────────────────────────────────────────────

/// `GET /cohorts/{id}/members`
pub async fn list_members<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(cohort_id): Path<CohortId>,
) -> Result<Json<Vec<Contact>>, ApiError>
where
  S: TenantStore,
{
  guard::cohort(store.as_ref(), user_id, cohort_id, Action::View).await?;
  let contacts = store
    .cohort_contacts(cohort_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(contacts))
}

/// `PUT /cohorts/{id}/members/{contact}`
///
/// A contact from another stream is reported as missing.
pub async fn put_member<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Path((cohort_id, contact_id)): Path<(CohortId, ContactId)>,
) -> Result<Json<CohortMember>, ApiError>
where
  S: TenantStore,
{
  let (cohort, _) =
    guard::cohort(store.as_ref(), user_id, cohort_id, Action::Add).await?;
  store
    .get_contact(contact_id)
    .await
    .map_err(ApiError::store)?
    .filter(|c| c.stream_id == cohort.stream_id)
    .ok_or(ApiError::NotFound)?;

  let member = store
    .add_cohort_member(cohort_id, contact_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(member))
}

/// `DELETE /cohorts/{id}/members/{contact}`
pub async fn delete_member<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Path((cohort_id, contact_id)): Path<(CohortId, ContactId)>,
) -> Result<StatusCode, ApiError>
where
  S: TenantStore,
{
  guard::cohort(store.as_ref(), user_id, cohort_id, Action::Edit).await?;
  if !store
    .remove_cohort_member(cohort_id, contact_id)
    .await
    .map_err(ApiError::store)?
  {
    return Err(ApiError::NotFound);
  }
  Ok(StatusCode::NO_CONTENT)
}

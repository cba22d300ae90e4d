//! Handlers for `/streams` endpoints.
//!
//! | Method   | Path                           | Gate                        |
//! |----------|--------------------------------|-----------------------------|
//! | `GET`    | `/streams`                     | accessible set              |
//! | `POST`   | `/streams`                     | writing role in `team_id`   |
//! | `GET`    | `/streams/{id}`                | view                        |
//! | `DELETE` | `/streams/{id}`                | delete (direct owner)       |
//! | `GET`    | `/streams/{id}/access`         | none; reports own level     |
//! | `GET`    | `/streams/{id}/shares`         | view                        |
//! | `PUT`    | `/streams/{id}/shares/{team}`  | manage (direct owner)       |
//! | `DELETE` | `/streams/{id}/shares/{team}`  | manage (direct owner)       |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use churn_core::{
  AccessLevel, AccessResolver, Action, ShareLevel, StreamId, TeamId,
  store::TenantStore,
  stream::{NewStream, StreamAccess},
  team::TeamStreamShare,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
  auth::CurrentUser,
  error::ApiError,
  guard::{non_blank, require},
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /streams`: every stream the caller can reach, with their level.
pub async fn list<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<StreamAccess>>, ApiError>
where
  S: TenantStore,
{
  let resolver = AccessResolver::new(store.as_ref());
  let ids = resolver.list_accessible_stream_ids(user_id).await?;
  let streams = store.get_streams(&ids).await.map_err(ApiError::store)?;

  let mut out = Vec::with_capacity(streams.len());
  for stream in streams {
    let access = resolver
      .resolve_stream_access(user_id, stream.stream_id)
      .await?;
    out.push(StreamAccess { stream, access });
  }
  Ok(Json(out))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:    String,
  /// Create the stream under this team; the caller needs a writing role.
  pub team_id: Option<TeamId>,
}

/// `POST /streams`: the caller becomes the direct owner.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TenantStore,
{
  let name = non_blank("name", body.name)?;

  if let Some(team_id) = body.team_id {
    let memberships = store
      .memberships_for_user(user_id)
      .await
      .map_err(ApiError::store)?;
    let membership = memberships
      .iter()
      .find(|m| m.team_id == team_id)
      .ok_or(ApiError::NotFound)?;
    if !membership.role.can_write() {
      return Err(ApiError::Forbidden(format!(
        "a {} cannot create streams for team {team_id}",
        membership.role
      )));
    }
  }

  let stream = store
    .add_stream(NewStream { name, owner_id: Some(user_id), team_id: body.team_id })
    .await
    .map_err(ApiError::store)?;
  info!(%user_id, stream_id = %stream.stream_id, "stream created");
  Ok((
    StatusCode::CREATED,
    Json(StreamAccess { stream, access: AccessLevel::Owner }),
  ))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /streams/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(stream_id): Path<StreamId>,
) -> Result<Json<StreamAccess>, ApiError>
where
  S: TenantStore,
{
  let access = require(store.as_ref(), user_id, stream_id, Action::View).await?;
  let stream = store
    .get_stream(stream_id)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::NotFound)?;
  Ok(Json(StreamAccess { stream, access }))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /streams/{id}`: cascades to contacts, notes, and shares.
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(stream_id): Path<StreamId>,
) -> Result<StatusCode, ApiError>
where
  S: TenantStore,
{
  require(store.as_ref(), user_id, stream_id, Action::Delete).await?;
  if !store.delete_stream(stream_id).await.map_err(ApiError::store)? {
    return Err(ApiError::NotFound);
  }
  info!(%user_id, %stream_id, "stream deleted");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Access ───────────────────────────────────────────────────────────────────

/// The caller's own standing on a stream.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessReport {
  pub stream_id:  StreamId,
  pub access:     AccessLevel,
  pub can_add:    bool,
  pub can_edit:   bool,
  pub can_delete: bool,
}

impl AccessReport {
  fn new(stream_id: StreamId, access: AccessLevel) -> Self {
    Self {
      stream_id,
      access,
      can_add: access.can_add(),
      can_edit: access.can_edit(),
      can_delete: access.can_delete(),
    }
  }
}

/// `GET /streams/{id}/access`: `none` for missing and hidden streams alike.
pub async fn access<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(stream_id): Path<StreamId>,
) -> Result<Json<AccessReport>, ApiError>
where
  S: TenantStore,
{
  let level = AccessResolver::new(store.as_ref())
    .resolve_stream_access(user_id, stream_id)
    .await?;
  Ok(Json(AccessReport::new(stream_id, level)))
}

// ─── Shares ───────────────────────────────────────────────────────────────────

/// `GET /streams/{id}/shares`
pub async fn list_shares<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(stream_id): Path<StreamId>,
) -> Result<Json<Vec<TeamStreamShare>>, ApiError>
where
  S: TenantStore,
{
  require(store.as_ref(), user_id, stream_id, Action::View).await?;
  let shares = store
    .shares_for_stream(stream_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(shares))
}

#[derive(Debug, Deserialize)]
pub struct ShareBody {
  pub access_level: ShareLevel,
}

/// `PUT /streams/{id}/shares/{team}`: body: `{"access_level":"view"|"edit"}`
pub async fn put_share<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Path((stream_id, team_id)): Path<(StreamId, TeamId)>,
  Json(body): Json<ShareBody>,
) -> Result<Json<TeamStreamShare>, ApiError>
where
  S: TenantStore,
{
  require(store.as_ref(), user_id, stream_id, Action::Manage).await?;
  store
    .get_team(team_id)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::NotFound)?;

  let share = store
    .put_share(stream_id, team_id, body.access_level)
    .await
    .map_err(ApiError::store)?;
  info!(%user_id, %stream_id, %team_id, level = %share.access_level, "stream shared");
  Ok(Json(share))
}

/// `DELETE /streams/{id}/shares/{team}`
pub async fn delete_share<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Path((stream_id, team_id)): Path<(StreamId, TeamId)>,
) -> Result<StatusCode, ApiError>
where
  S: TenantStore,
{
  require(store.as_ref(), user_id, stream_id, Action::Manage).await?;
  if !store
    .remove_share(stream_id, team_id)
    .await
    .map_err(ApiError::store)?
  {
    return Err(ApiError::NotFound);
  }
  info!(%user_id, %stream_id, %team_id, "stream unshared");
  Ok(StatusCode::NO_CONTENT)
}

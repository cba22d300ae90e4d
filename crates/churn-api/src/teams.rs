//! Handlers for `/teams` endpoints.
//!
//! | Method   | Path                          | Notes                          |
//! |----------|-------------------------------|--------------------------------|
//! | `GET`    | `/teams`                      | Teams the caller belongs to    |
//! | `POST`   | `/teams`                      | Caller becomes `owner`         |
//! | `GET`    | `/teams/{id}/members`         | Members only                   |
//! | `PUT`    | `/teams/{id}/members/{user}`  | Team owners only; upsert       |
//! | `DELETE` | `/teams/{id}/members/{user}`  | Team owners only               |
//!
//! A team always keeps at least one `owner`. Demoting or removing the last
//! one is rejected with 409; the store checks and writes in one transaction.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use churn_core::{
  TeamId, TeamRole, UserId,
  store::{MemberChange, TenantStore},
  team::{MemberTeam, TeamMembership},
};
use serde::Deserialize;
use tracing::info;

use crate::{auth::CurrentUser, error::ApiError, guard::non_blank};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /teams`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<MemberTeam>>, ApiError>
where
  S: TenantStore,
{
  let teams = store
    .teams_for_user(user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(teams))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name: String,
}

/// `POST /teams`: body: `{"name":"..."}`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TenantStore,
{
  let name = non_blank("name", body.name)?;
  let team = store
    .add_team(name, user_id)
    .await
    .map_err(ApiError::store)?;
  info!(%user_id, team_id = %team.team_id, "team created");
  Ok((
    StatusCode::CREATED,
    Json(MemberTeam { team, role: TeamRole::Owner }),
  ))
}

// ─── Members ──────────────────────────────────────────────────────────────────

/// Load the member list and the caller's role in it. Non-members get 404.
async fn members_as<S: TenantStore>(
  store: &S,
  team_id: TeamId,
  caller: UserId,
) -> Result<(Vec<TeamMembership>, TeamRole), ApiError> {
  let members = store
    .team_members(team_id)
    .await
    .map_err(ApiError::store)?;
  let role = members
    .iter()
    .find(|m| m.user_id == caller)
    .map(|m| m.role)
    .ok_or(ApiError::NotFound)?;
  Ok((members, role))
}

fn require_team_owner(role: TeamRole) -> Result<(), ApiError> {
  if role == TeamRole::Owner {
    Ok(())
  } else {
    Err(ApiError::Forbidden(format!(
      "a team {role} cannot change membership"
    )))
  }
}

fn last_owner(team_id: TeamId, member_id: UserId) -> ApiError {
  ApiError::Conflict(format!(
    "user {member_id} is the last owner of team {team_id}"
  ))
}

/// `GET /teams/{id}/members`
pub async fn list_members<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(team_id): Path<TeamId>,
) -> Result<Json<Vec<TeamMembership>>, ApiError>
where
  S: TenantStore,
{
  let (members, _) = members_as(store.as_ref(), team_id, user_id).await?;
  Ok(Json(members))
}

#[derive(Debug, Deserialize)]
pub struct MemberBody {
  pub role: TeamRole,
}

/// `PUT /teams/{id}/members/{user}`: body: `{"role":"owner"|"editor"|"viewer"}`
pub async fn put_member<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Path((team_id, member_id)): Path<(TeamId, UserId)>,
  Json(body): Json<MemberBody>,
) -> Result<Json<TeamMembership>, ApiError>
where
  S: TenantStore,
{
  let (_, role) = members_as(store.as_ref(), team_id, user_id).await?;
  require_team_owner(role)?;

  store
    .get_user(member_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::BadRequest(format!("unknown user {member_id}")))?;

  let membership = match store
    .set_member(team_id, member_id, body.role)
    .await
    .map_err(ApiError::store)?
  {
    MemberChange::Applied(membership) => membership,
    MemberChange::LastOwner => return Err(last_owner(team_id, member_id)),
  };
  info!(%user_id, %team_id, %member_id, role = %membership.role, "member set");
  Ok(Json(membership))
}

/// `DELETE /teams/{id}/members/{user}`
pub async fn delete_member<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Path((team_id, member_id)): Path<(TeamId, UserId)>,
) -> Result<StatusCode, ApiError>
where
  S: TenantStore,
{
  let (_, role) = members_as(store.as_ref(), team_id, user_id).await?;
  require_team_owner(role)?;

  match store
    .remove_member(team_id, member_id)
    .await
    .map_err(ApiError::store)?
  {
    MemberChange::Applied(true) => {}
    MemberChange::Applied(false) => return Err(ApiError::NotFound),
    MemberChange::LastOwner => return Err(last_owner(team_id, member_id)),
  }
  info!(%user_id, %team_id, %member_id, "member removed");
  Ok(StatusCode::NO_CONTENT)
}

//! [`AccessResolver`]: the single place stream access is decided.
//!
//! Resolution order:
//!
//! 1. Direct ownership short-circuits to [`AccessLevel::Owner`].
//! 2. Otherwise every team the user belongs to is examined for its role, its
//!    ownership of the stream, and its explicit share.
//! 3. The highest team contribution wins; no relation at all is
//!    [`AccessLevel::None`].
//!
//! Denials are ordinary return values. Only store failures surface as
//! [`Error::StoreUnavailable`]. A stream that does not exist resolves to
//! `none` like any other unreachable stream.

use std::collections::BTreeSet;

use tracing::debug;

use crate::{
  Error, Result,
  access::{AccessLevel, Action, TeamGrant, effective_level},
  id::{StreamId, TeamId, UserId},
  store::AccessStore,
};

/// Computes effective stream access from the store's current state.
///
/// Holds nothing but a borrowed store; every call re-reads the three base
/// relations.
pub struct AccessResolver<'s, S> {
  store: &'s S,
}

impl<S> Clone for AccessResolver<'_, S> {
  fn clone(&self) -> Self { *self }
}

impl<S> Copy for AccessResolver<'_, S> {}

impl<'s, S: AccessStore> AccessResolver<'s, S> {
  pub fn new(store: &'s S) -> Self { Self { store } }

  /// The effective level of `user_id` on `stream_id`.
  pub async fn resolve_stream_access(
    &self,
    user_id: UserId,
    stream_id: StreamId,
  ) -> Result<AccessLevel> {
    let direct = self
      .store
      .is_direct_owner(stream_id, user_id)
      .await
      .map_err(Error::store)?;
    if direct {
      debug!(%user_id, %stream_id, "direct owner");
      return Ok(AccessLevel::Owner);
    }

    let grants = self.team_grants(user_id, stream_id).await?;
    let level = effective_level(false, &grants);
    debug!(%user_id, %stream_id, teams = grants.len(), %level, "resolved stream access");
    Ok(level)
  }

  /// Every stream `user_id` can reach at any level.
  pub async fn list_accessible_stream_ids(
    &self,
    user_id: UserId,
  ) -> Result<BTreeSet<StreamId>> {
    let team_ids = self.team_ids(user_id).await?;
    self
      .store
      .reachable_stream_ids(user_id, &team_ids)
      .await
      .map_err(Error::store)
  }

  pub async fn has_at_least_view_access(
    &self,
    user_id: UserId,
    stream_id: StreamId,
  ) -> Result<bool> {
    Ok(
      self
        .resolve_stream_access(user_id, stream_id)
        .await?
        .can_view(),
    )
  }

  /// Resolve and test `action` in one step. Returns the level alongside the
  /// verdict so callers can tell a hidden stream from a read-only one.
  pub async fn check(
    &self,
    user_id: UserId,
    stream_id: StreamId,
    action: Action,
  ) -> Result<(AccessLevel, bool)> {
    let level = self.resolve_stream_access(user_id, stream_id).await?;
    Ok((level, level.allows(action)))
  }

  async fn team_ids(&self, user_id: UserId) -> Result<Vec<TeamId>> {
    let memberships = self
      .store
      .memberships_for_user(user_id)
      .await
      .map_err(Error::store)?;
    Ok(memberships.into_iter().map(|m| m.team_id).collect())
  }

  async fn team_grants(
    &self,
    user_id: UserId,
    stream_id: StreamId,
  ) -> Result<Vec<TeamGrant>> {
    let memberships = self
      .store
      .memberships_for_user(user_id)
      .await
      .map_err(Error::store)?;
    if memberships.is_empty() {
      return Ok(Vec::new());
    }

    let team_ids: Vec<TeamId> = memberships.iter().map(|m| m.team_id).collect();
    let relations = self
      .store
      .stream_team_relations(stream_id, &team_ids)
      .await
      .map_err(Error::store)?;

    Ok(
      memberships
        .iter()
        .map(|m| TeamGrant {
          team_id:     m.team_id,
          role:        m.role,
          owns_stream: relations.owning_teams.contains(&m.team_id),
          share:       relations.shares.get(&m.team_id).copied(),
        })
        .collect(),
    )
  }
}

//! Resolver tests against an in-memory fixture store.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;

use crate::{
  AccessLevel, AccessResolver, Action, Error, ShareLevel, StreamId, TeamId,
  TeamRole, UserId,
  store::{AccessStore, StreamTeamRelations},
  team::TeamMembership,
};

// ─── Fixture ─────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("fixture store offline")]
struct Offline;

#[derive(Default)]
struct Fixture {
  /// stream -> (direct owner, owning team)
  streams: BTreeMap<i64, (Option<i64>, Option<i64>)>,
  /// (team, user) -> role
  members: BTreeMap<(i64, i64), TeamRole>,
  /// (team, stream) -> level
  shares:  BTreeMap<(i64, i64), ShareLevel>,
  offline: bool,
}

impl Fixture {
  fn stream(mut self, id: i64, owner: Option<i64>, team: Option<i64>) -> Self {
    self.streams.insert(id, (owner, team));
    self
  }

  fn member(mut self, team: i64, user: i64, role: TeamRole) -> Self {
    self.members.insert((team, user), role);
    self
  }

  fn share(mut self, team: i64, stream: i64, level: ShareLevel) -> Self {
    self.shares.insert((team, stream), level);
    self
  }

  fn check_online(&self) -> Result<(), Offline> {
    if self.offline { Err(Offline) } else { Ok(()) }
  }
}

fn user(n: i64) -> UserId { UserId::new(n).unwrap() }
fn stream(n: i64) -> StreamId { StreamId::new(n).unwrap() }
fn team(n: i64) -> TeamId { TeamId::new(n).unwrap() }

impl AccessStore for Fixture {
  type Error = Offline;

  async fn is_direct_owner(
    &self,
    stream_id: StreamId,
    user_id: UserId,
  ) -> Result<bool, Offline> {
    self.check_online()?;
    Ok(matches!(
      self.streams.get(&stream_id.get()),
      Some((Some(owner), _)) if *owner == user_id.get()
    ))
  }

  async fn memberships_for_user(
    &self,
    user_id: UserId,
  ) -> Result<Vec<TeamMembership>, Offline> {
    self.check_online()?;
    Ok(
      self
        .members
        .iter()
        .filter(|((_, u), _)| *u == user_id.get())
        .map(|((t, u), role)| TeamMembership {
          team_id:   team(*t),
          user_id:   user(*u),
          role:      *role,
          joined_at: Utc::now(),
        })
        .collect(),
    )
  }

  async fn stream_team_relations(
    &self,
    stream_id: StreamId,
    team_ids: &[TeamId],
  ) -> Result<StreamTeamRelations, Offline> {
    self.check_online()?;
    let mut relations = StreamTeamRelations::default();
    for t in team_ids {
      if let Some(level) = self.shares.get(&(t.get(), stream_id.get())) {
        relations.shares.insert(*t, *level);
      }
      if matches!(
        self.streams.get(&stream_id.get()),
        Some((_, Some(owning))) if *owning == t.get()
      ) {
        relations.owning_teams.insert(*t);
      }
    }
    Ok(relations)
  }

  async fn reachable_stream_ids(
    &self,
    user_id: UserId,
    team_ids: &[TeamId],
  ) -> Result<BTreeSet<StreamId>, Offline> {
    self.check_online()?;
    let teams: BTreeSet<i64> = team_ids.iter().map(|t| t.get()).collect();
    let mut ids = BTreeSet::new();
    for (id, (owner, owning)) in &self.streams {
      let direct = *owner == Some(user_id.get());
      let team_owned = owning.is_some_and(|t| teams.contains(&t));
      if direct || team_owned {
        ids.insert(stream(*id));
      }
    }
    for (t, s) in self.shares.keys() {
      if teams.contains(t) {
        ids.insert(stream(*s));
      }
    }
    Ok(ids)
  }
}

async fn level(f: &Fixture, u: i64, s: i64) -> AccessLevel {
  AccessResolver::new(f)
    .resolve_stream_access(user(u), stream(s))
    .await
    .unwrap()
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn direct_owner_without_teams() {
  let f = Fixture::default().stream(1, Some(10), None);
  let got = level(&f, 10, 1).await;
  assert_eq!(got, AccessLevel::Owner);
  assert!(got.can_delete());
}

#[tokio::test]
async fn editor_role_with_edit_share() {
  let f = Fixture::default()
    .stream(1, Some(99), None)
    .member(5, 10, TeamRole::Editor)
    .share(5, 1, ShareLevel::Edit);
  let got = level(&f, 10, 1).await;
  assert_eq!(got, AccessLevel::Editor);
  assert!(got.can_edit());
  assert!(!got.can_delete());
}

#[tokio::test]
async fn viewer_role_in_owning_team() {
  let f = Fixture::default()
    .stream(1, None, Some(5))
    .member(5, 10, TeamRole::Viewer);
  assert_eq!(level(&f, 10, 1).await, AccessLevel::Viewer);
}

#[tokio::test]
async fn no_teams_no_access() {
  let f = Fixture::default()
    .stream(1, Some(99), Some(5))
    .member(5, 99, TeamRole::Owner);
  assert_eq!(level(&f, 10, 1).await, AccessLevel::None);

  let ids = AccessResolver::new(&f)
    .list_accessible_stream_ids(user(10))
    .await
    .unwrap();
  assert!(!ids.contains(&stream(1)));
}

#[tokio::test]
async fn highest_team_wins() {
  let f = Fixture::default()
    .stream(1, Some(99), None)
    .member(1, 10, TeamRole::Owner)
    .share(1, 1, ShareLevel::View)
    .member(2, 10, TeamRole::Editor)
    .share(2, 1, ShareLevel::Edit);
  assert_eq!(level(&f, 10, 1).await, AccessLevel::Editor);
}

// ─── Properties ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn ownership_is_not_lowered_by_teams() {
  let f = Fixture::default()
    .stream(1, Some(10), Some(5))
    .member(5, 10, TeamRole::Viewer)
    .share(5, 1, ShareLevel::View);
  assert_eq!(level(&f, 10, 1).await, AccessLevel::Owner);
}

#[tokio::test]
async fn team_ownership_with_writing_role_needs_no_share() {
  for role in [TeamRole::Owner, TeamRole::Editor] {
    let f = Fixture::default()
      .stream(1, Some(99), Some(5))
      .member(5, 10, role);
    assert_eq!(level(&f, 10, 1).await, AccessLevel::Editor, "{role}");
  }
}

#[tokio::test]
async fn view_share_caps_team_owner_role() {
  let f = Fixture::default()
    .stream(1, Some(99), Some(7))
    .member(5, 10, TeamRole::Owner)
    .share(5, 1, ShareLevel::View);
  assert_eq!(level(&f, 10, 1).await, AccessLevel::Viewer);
}

#[tokio::test]
async fn team_without_relation_grants_nothing() {
  let f = Fixture::default()
    .stream(1, Some(99), None)
    .stream(2, None, Some(5))
    .member(5, 10, TeamRole::Owner);
  assert_eq!(level(&f, 10, 1).await, AccessLevel::None);
  assert_eq!(level(&f, 10, 2).await, AccessLevel::Editor);
}

#[tokio::test]
async fn missing_stream_resolves_to_none() {
  let f = Fixture::default().member(5, 10, TeamRole::Owner);
  let resolver = AccessResolver::new(&f);
  assert_eq!(level(&f, 10, 404).await, AccessLevel::None);
  assert!(
    !resolver
      .has_at_least_view_access(user(10), stream(404))
      .await
      .unwrap()
  );
}

#[tokio::test]
async fn resolution_is_idempotent() {
  let f = Fixture::default()
    .stream(1, None, Some(5))
    .member(5, 10, TeamRole::Editor)
    .share(6, 1, ShareLevel::View)
    .member(6, 10, TeamRole::Viewer);
  let first = level(&f, 10, 1).await;
  let second = level(&f, 10, 1).await;
  assert_eq!(first, second);
}

#[tokio::test]
async fn accessible_set_matches_resolution() {
  let f = Fixture::default()
    .stream(1, Some(10), None)
    .stream(2, None, Some(5))
    .stream(3, Some(99), None)
    .stream(4, Some(99), Some(8))
    .stream(5, None, None)
    .member(5, 10, TeamRole::Viewer)
    .member(6, 10, TeamRole::Editor)
    .share(6, 3, ShareLevel::View)
    .share(9, 5, ShareLevel::Edit);

  let resolver = AccessResolver::new(&f);
  let ids = resolver.list_accessible_stream_ids(user(10)).await.unwrap();
  assert_eq!(ids, [stream(1), stream(2), stream(3)].into_iter().collect());

  for s in 1..=6 {
    let reachable = level(&f, 10, s).await != AccessLevel::None;
    assert_eq!(ids.contains(&stream(s)), reachable, "stream {s}");
  }
}

#[tokio::test]
async fn check_reports_level_and_verdict() {
  let f = Fixture::default()
    .stream(1, None, Some(5))
    .member(5, 10, TeamRole::Viewer);
  let resolver = AccessResolver::new(&f);

  let (lvl, ok) = resolver.check(user(10), stream(1), Action::Add).await.unwrap();
  assert_eq!(lvl, AccessLevel::Viewer);
  assert!(ok);

  let (_, ok) = resolver.check(user(10), stream(1), Action::Edit).await.unwrap();
  assert!(!ok);
}

#[tokio::test]
async fn store_failure_is_not_a_denial() {
  let mut f = Fixture::default().stream(1, Some(10), None);
  f.offline = true;
  let resolver = AccessResolver::new(&f);

  let err = resolver
    .resolve_stream_access(user(10), stream(1))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::StoreUnavailable(_)));

  let err = resolver.list_accessible_stream_ids(user(10)).await.unwrap_err();
  assert!(matches!(err, Error::StoreUnavailable(_)));
}

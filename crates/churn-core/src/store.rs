//! The store traits and supporting query types.
//!
//! [`AccessStore`] is the narrow read contract the resolver needs. It is kept
//! separate so that access resolution can be exercised against any backend
//! that can answer three questions. [`TenantStore`] adds the CRUD surface
//! used by the API layer.

use std::{
  collections::{BTreeMap, BTreeSet},
  future::Future,
};

use crate::{
  access::{ShareLevel, TeamRole},
  cohort::{Cohort, CohortMember, NewCohort},
  contact::{Contact, ContactNote, ContactPatch, NewContact, NewNote, NotePatch},
  id::{CohortId, ContactId, NoteId, StreamId, TeamId, UserId},
  stream::{NewStream, Stream},
  team::{MemberTeam, Team, TeamMembership, TeamStreamShare, User},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// How a set of teams relates to a single stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamTeamRelations {
  /// Explicit shares, keyed by team. At most one per team.
  pub shares:       BTreeMap<TeamId, ShareLevel>,
  /// Teams from the queried set whose id equals `stream.team_id`.
  pub owning_teams: BTreeSet<TeamId>,
}

/// Parameters for [`TenantStore::search_contacts`].
#[derive(Debug, Clone, Default)]
pub struct ContactQuery {
  /// Streams to search within. An empty set matches nothing.
  pub stream_ids: BTreeSet<StreamId>,
  /// Case-insensitive substring filter over name, email, and company.
  pub text:       Option<String>,
  pub limit:      Option<usize>,
  pub offset:     Option<usize>,
}

/// Outcome of a membership write that must leave the team an `owner`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberChange<T> {
  Applied(T),
  /// Refused: the change would leave the team without any `owner`.
  LastOwner,
}

impl<T> MemberChange<T> {
  pub fn applied(self) -> Option<T> {
    match self {
      Self::Applied(value) => Some(value),
      Self::LastOwner => None,
    }
  }
}

// ─── Access reads ────────────────────────────────────────────────────────────

/// The read queries access resolution is built from.
///
/// Implementations must answer from committed, current state; nothing here is
/// allowed to be cached across calls.
pub trait AccessStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Does `stream_id` have `user_id` as its direct owner? `false` for a
  /// stream that does not exist.
  fn is_direct_owner(
    &self,
    stream_id: StreamId,
    user_id: UserId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Every (team, role) membership held by `user_id`.
  fn memberships_for_user(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Vec<TeamMembership>, Self::Error>> + Send + '_;

  /// Shares on `stream_id` held by any of `team_ids`, and which of them own
  /// the stream directly.
  fn stream_team_relations<'a>(
    &'a self,
    stream_id: StreamId,
    team_ids: &'a [TeamId],
  ) -> impl Future<Output = Result<StreamTeamRelations, Self::Error>> + Send + 'a;

  /// Streams owned by `user_id`, owned by any of `team_ids`, or shared to any
  /// of `team_ids`.
  fn reachable_stream_ids<'a>(
    &'a self,
    user_id: UserId,
    team_ids: &'a [TeamId],
  ) -> impl Future<Output = Result<BTreeSet<StreamId>, Self::Error>> + Send + 'a;
}

// ─── Tenant CRUD ─────────────────────────────────────────────────────────────

/// Full persistence surface for the application.
///
/// None of these methods check permissions. Callers gate every call through
/// [`crate::AccessResolver`] first.
pub trait TenantStore: AccessStore {
  // ── Users ─────────────────────────────────────────────────────────────

  fn add_user(
    &self,
    display_name: String,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  // ── Streams ───────────────────────────────────────────────────────────

  fn add_stream(
    &self,
    input: NewStream,
  ) -> impl Future<Output = Result<Stream, Self::Error>> + Send + '_;

  fn get_stream(
    &self,
    stream_id: StreamId,
  ) -> impl Future<Output = Result<Option<Stream>, Self::Error>> + Send + '_;

  /// Fetch every stream in `stream_ids`, ordered by id. Missing ids are
  /// skipped.
  fn get_streams<'a>(
    &'a self,
    stream_ids: &'a BTreeSet<StreamId>,
  ) -> impl Future<Output = Result<Vec<Stream>, Self::Error>> + Send + 'a;

  /// Delete a stream together with its contacts, notes, and shares.
  /// Returns `false` if it did not exist.
  fn delete_stream(
    &self,
    stream_id: StreamId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Teams ─────────────────────────────────────────────────────────────

  /// Create a team with `creator` as its first `owner`-role member.
  fn add_team(
    &self,
    name: String,
    creator: UserId,
  ) -> impl Future<Output = Result<Team, Self::Error>> + Send + '_;

  fn get_team(
    &self,
    team_id: TeamId,
  ) -> impl Future<Output = Result<Option<Team>, Self::Error>> + Send + '_;

  /// Teams `user_id` belongs to, with the user's role in each.
  fn teams_for_user(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Vec<MemberTeam>, Self::Error>> + Send + '_;

  fn team_members(
    &self,
    team_id: TeamId,
  ) -> impl Future<Output = Result<Vec<TeamMembership>, Self::Error>> + Send + '_;

  /// Insert or update a membership. Demoting the last `owner` is refused
  /// in the same transaction as the write.
  fn set_member(
    &self,
    team_id: TeamId,
    user_id: UserId,
    role: TeamRole,
  ) -> impl Future<Output = Result<MemberChange<TeamMembership>, Self::Error>>
  + Send
  + '_;

  /// Remove a membership; `Applied(false)` if there was none. Removing the
  /// last `owner` is refused atomically.
  fn remove_member(
    &self,
    team_id: TeamId,
    user_id: UserId,
  ) -> impl Future<Output = Result<MemberChange<bool>, Self::Error>> + Send + '_;

  // ── Shares ────────────────────────────────────────────────────────────

  /// Insert or update the share for (team, stream).
  fn put_share(
    &self,
    stream_id: StreamId,
    team_id: TeamId,
    access_level: ShareLevel,
  ) -> impl Future<Output = Result<TeamStreamShare, Self::Error>> + Send + '_;

  fn remove_share(
    &self,
    stream_id: StreamId,
    team_id: TeamId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn shares_for_stream(
    &self,
    stream_id: StreamId,
  ) -> impl Future<Output = Result<Vec<TeamStreamShare>, Self::Error>> + Send + '_;

  // ── Contacts ──────────────────────────────────────────────────────────

  fn add_contact(
    &self,
    input: NewContact,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  fn get_contact(
    &self,
    contact_id: ContactId,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// Apply `patch`; returns `None` if the contact does not exist.
  fn update_contact(
    &self,
    contact_id: ContactId,
    patch: ContactPatch,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// Delete a contact and its notes.
  fn delete_contact(
    &self,
    contact_id: ContactId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn search_contacts<'a>(
    &'a self,
    query: &'a ContactQuery,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + 'a;

  // ── Notes ─────────────────────────────────────────────────────────────

  fn add_note(
    &self,
    input: NewNote,
  ) -> impl Future<Output = Result<ContactNote, Self::Error>> + Send + '_;

  fn get_note(
    &self,
    note_id: NoteId,
  ) -> impl Future<Output = Result<Option<ContactNote>, Self::Error>> + Send + '_;

  /// All notes on a contact, oldest first, private ones included.
  fn notes_for_contact(
    &self,
    contact_id: ContactId,
  ) -> impl Future<Output = Result<Vec<ContactNote>, Self::Error>> + Send + '_;

  fn update_note(
    &self,
    note_id: NoteId,
    patch: NotePatch,
  ) -> impl Future<Output = Result<Option<ContactNote>, Self::Error>> + Send + '_;

  fn delete_note(
    &self,
    note_id: NoteId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Cohorts ───────────────────────────────────────────────────────────

  fn add_cohort(
    &self,
    input: NewCohort,
  ) -> impl Future<Output = Result<Cohort, Self::Error>> + Send + '_;

  fn get_cohort(
    &self,
    cohort_id: CohortId,
  ) -> impl Future<Output = Result<Option<Cohort>, Self::Error>> + Send + '_;

  /// Cohorts in any of `stream_ids`, ordered by id. An empty set matches
  /// nothing.
  fn list_cohorts<'a>(
    &'a self,
    stream_ids: &'a BTreeSet<StreamId>,
  ) -> impl Future<Output = Result<Vec<Cohort>, Self::Error>> + Send + 'a;

  /// Delete a cohort and its memberships. Contacts are untouched.
  fn delete_cohort(
    &self,
    cohort_id: CohortId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Add a contact to a cohort; adding an existing member keeps `added_at`.
  fn add_cohort_member(
    &self,
    cohort_id: CohortId,
    contact_id: ContactId,
  ) -> impl Future<Output = Result<CohortMember, Self::Error>> + Send + '_;

  fn remove_cohort_member(
    &self,
    cohort_id: CohortId,
    contact_id: ContactId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Member contacts, ordered by contact id.
  fn cohort_contacts(
    &self,
    cohort_id: CohortId,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + '_;
}

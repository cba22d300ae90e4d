//! A store whose access reads can be switched off, for exercising the 503
//! path through the real router.

use std::{
  collections::BTreeSet,
  sync::atomic::{AtomicBool, Ordering},
};

use churn_core::{
  CohortId, ContactId, NoteId, StreamId, TeamId, UserId,
  access::{ShareLevel, TeamRole},
  cohort::{Cohort, CohortMember, NewCohort},
  contact::{Contact, ContactNote, ContactPatch, NewContact, NewNote, NotePatch},
  store::{
    AccessStore, ContactQuery, MemberChange, StreamTeamRelations, TenantStore,
  },
  stream::{NewStream, Stream},
  team::{MemberTeam, Team, TeamMembership, TeamStreamShare, User},
};
use churn_store_sqlite::SqliteStore;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlakyError {
  #[error("connection lost")]
  Offline,

  #[error(transparent)]
  Store(#[from] churn_store_sqlite::Error),
}

type Result<T> = std::result::Result<T, FlakyError>;

/// Wraps [`SqliteStore`]. While `offline` is set, every [`AccessStore`] read
/// fails; the CRUD surface keeps working so the current user still loads.
pub struct Flaky {
  inner:   SqliteStore,
  offline: AtomicBool,
}

impl Flaky {
  pub async fn new() -> Self {
    Self {
      inner:   SqliteStore::open_in_memory().await.unwrap(),
      offline: AtomicBool::new(false),
    }
  }

  pub fn set_offline(&self, offline: bool) {
    self.offline.store(offline, Ordering::SeqCst);
  }

  fn online(&self) -> Result<()> {
    if self.offline.load(Ordering::SeqCst) {
      Err(FlakyError::Offline)
    } else {
      Ok(())
    }
  }
}

impl AccessStore for Flaky {
  type Error = FlakyError;

  async fn is_direct_owner(
    &self,
    stream_id: StreamId,
    user_id: UserId,
  ) -> Result<bool> {
    self.online()?;
    Ok(self.inner.is_direct_owner(stream_id, user_id).await?)
  }

  async fn memberships_for_user(
    &self,
    user_id: UserId,
  ) -> Result<Vec<TeamMembership>> {
    self.online()?;
    Ok(self.inner.memberships_for_user(user_id).await?)
  }

  async fn stream_team_relations(
    &self,
    stream_id: StreamId,
    team_ids: &[TeamId],
  ) -> Result<StreamTeamRelations> {
    self.online()?;
    Ok(self.inner.stream_team_relations(stream_id, team_ids).await?)
  }

  async fn reachable_stream_ids(
    &self,
    user_id: UserId,
    team_ids: &[TeamId],
  ) -> Result<BTreeSet<StreamId>> {
    self.online()?;
    Ok(self.inner.reachable_stream_ids(user_id, team_ids).await?)
  }
}

impl TenantStore for Flaky {
  async fn add_user(&self, display_name: String) -> Result<User> {
    Ok(self.inner.add_user(display_name).await?)
  }

  async fn get_user(&self, user_id: UserId) -> Result<Option<User>> {
    Ok(self.inner.get_user(user_id).await?)
  }

  async fn add_stream(&self, input: NewStream) -> Result<Stream> {
    Ok(self.inner.add_stream(input).await?)
  }

  async fn get_stream(&self, stream_id: StreamId) -> Result<Option<Stream>> {
    Ok(self.inner.get_stream(stream_id).await?)
  }

  async fn get_streams(
    &self,
    stream_ids: &BTreeSet<StreamId>,
  ) -> Result<Vec<Stream>> {
    Ok(self.inner.get_streams(stream_ids).await?)
  }

  async fn delete_stream(&self, stream_id: StreamId) -> Result<bool> {
    Ok(self.inner.delete_stream(stream_id).await?)
  }

  async fn add_team(&self, name: String, creator: UserId) -> Result<Team> {
    Ok(self.inner.add_team(name, creator).await?)
  }

  async fn get_team(&self, team_id: TeamId) -> Result<Option<Team>> {
    Ok(self.inner.get_team(team_id).await?)
  }

  async fn teams_for_user(&self, user_id: UserId) -> Result<Vec<MemberTeam>> {
    Ok(self.inner.teams_for_user(user_id).await?)
  }

  async fn team_members(&self, team_id: TeamId) -> Result<Vec<TeamMembership>> {
    Ok(self.inner.team_members(team_id).await?)
  }

  async fn set_member(
    &self,
    team_id: TeamId,
    user_id: UserId,
    role: TeamRole,
  ) -> Result<MemberChange<TeamMembership>> {
    Ok(self.inner.set_member(team_id, user_id, role).await?)
  }

  async fn remove_member(
    &self,
    team_id: TeamId,
    user_id: UserId,
  ) -> Result<MemberChange<bool>> {
    Ok(self.inner.remove_member(team_id, user_id).await?)
  }

  async fn put_share(
    &self,
    stream_id: StreamId,
    team_id: TeamId,
    access_level: ShareLevel,
  ) -> Result<TeamStreamShare> {
    Ok(self.inner.put_share(stream_id, team_id, access_level).await?)
  }

  async fn remove_share(&self, stream_id: StreamId, team_id: TeamId) -> Result<bool> {
    Ok(self.inner.remove_share(stream_id, team_id).await?)
  }

  async fn shares_for_stream(
    &self,
    stream_id: StreamId,
  ) -> Result<Vec<TeamStreamShare>> {
    Ok(self.inner.shares_for_stream(stream_id).await?)
  }

  async fn add_contact(&self, input: NewContact) -> Result<Contact> {
    Ok(self.inner.add_contact(input).await?)
  }

  async fn get_contact(&self, contact_id: ContactId) -> Result<Option<Contact>> {
    Ok(self.inner.get_contact(contact_id).await?)
  }

  async fn update_contact(
    &self,
    contact_id: ContactId,
    patch: ContactPatch,
  ) -> Result<Option<Contact>> {
    Ok(self.inner.update_contact(contact_id, patch).await?)
  }

  async fn delete_contact(&self, contact_id: ContactId) -> Result<bool> {
    Ok(self.inner.delete_contact(contact_id).await?)
  }

  async fn search_contacts(&self, query: &ContactQuery) -> Result<Vec<Contact>> {
    Ok(self.inner.search_contacts(query).await?)
  }

  async fn add_note(&self, input: NewNote) -> Result<ContactNote> {
    Ok(self.inner.add_note(input).await?)
  }

  async fn get_note(&self, note_id: NoteId) -> Result<Option<ContactNote>> {
    Ok(self.inner.get_note(note_id).await?)
  }

  async fn notes_for_contact(
    &self,
    contact_id: ContactId,
  ) -> Result<Vec<ContactNote>> {
    Ok(self.inner.notes_for_contact(contact_id).await?)
  }

  async fn update_note(
    &self,
    note_id: NoteId,
    patch: NotePatch,
  ) -> Result<Option<ContactNote>> {
    Ok(self.inner.update_note(note_id, patch).await?)
  }

  async fn delete_note(&self, note_id: NoteId) -> Result<bool> {
    Ok(self.inner.delete_note(note_id).await?)
  }

  async fn add_cohort(&self, input: NewCohort) -> Result<Cohort> {
    Ok(self.inner.add_cohort(input).await?)
  }

  async fn get_cohort(&self, cohort_id: CohortId) -> Result<Option<Cohort>> {
    Ok(self.inner.get_cohort(cohort_id).await?)
  }

  async fn list_cohorts(&self, stream_ids: &BTreeSet<StreamId>) -> Result<Vec<Cohort>> {
    Ok(self.inner.list_cohorts(stream_ids).await?)
  }

  async fn delete_cohort(&self, cohort_id: CohortId) -> Result<bool> {
    Ok(self.inner.delete_cohort(cohort_id).await?)
  }

  async fn add_cohort_member(
    &self,
    cohort_id: CohortId,
    contact_id: ContactId,
  ) -> Result<CohortMember> {
    Ok(self.inner.add_cohort_member(cohort_id, contact_id).await?)
  }

  async fn remove_cohort_member(
    &self,
    cohort_id: CohortId,
    contact_id: ContactId,
  ) -> Result<bool> {
    Ok(self.inner.remove_cohort_member(cohort_id, contact_id).await?)
  }

  async fn cohort_contacts(&self, cohort_id: CohortId) -> Result<Vec<Contact>> {
    Ok(self.inner.cohort_contacts(cohort_id).await?)
  }
}

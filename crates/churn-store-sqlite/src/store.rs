//! [`SqliteStore`]: the SQLite implementation of [`AccessStore`] and
//! [`TenantStore`].

use std::{collections::BTreeSet, path::Path};

use chrono::Utc;
use churn_core::{
  CohortId, ContactId, NoteId, ShareLevel, StreamId, TeamId, TeamRole, UserId,
  cohort::{Cohort, CohortMember, NewCohort},
  contact::{Contact, ContactNote, ContactPatch, NewContact, NewNote, NotePatch},
  store::{
    AccessStore, ContactQuery, MemberChange, StreamTeamRelations, TenantStore,
  },
  stream::{NewStream, Stream},
  team::{MemberTeam, Team, TeamMembership, TeamStreamShare, User},
};
use rusqlite::{OptionalExtension as _, TransactionBehavior, params};

use crate::{
  Result,
  encode::{
    COHORT_COLUMNS, CONTACT_COLUMNS, MEMBER_COLUMNS, NOTE_COLUMNS, RawCohort,
    RawCohortMember, RawContact, RawMembership, RawNote, RawShare, RawStream,
    RawTeam, RawUser, SHARE_COLUMNS, STREAM_COLUMNS, TEAM_COLUMNS, USER_COLUMNS,
    decode_enum, encode_dt, encode_notify, id_array, like_pattern,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        rusqlite::vtab::array::load_module(conn)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_stream(&self, stream_id: i64) -> Result<Option<Stream>> {
    let raw: Option<RawStream> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {STREAM_COLUMNS} FROM streams WHERE stream_id = ?1"),
              params![stream_id],
              RawStream::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawStream::into_stream).transpose()
  }
}

/// Whether taking `user_id` out of the `owner` role would leave `team_id`
/// without one.
fn strands_team(
  conn: &rusqlite::Connection,
  team_id: i64,
  user_id: i64,
) -> rusqlite::Result<bool> {
  let (is_owner, other_owners): (bool, i64) = conn.query_row(
    "SELECT
       EXISTS (SELECT 1 FROM team_members
               WHERE team_id = ?1 AND user_id = ?2 AND role = 'owner'),
       (SELECT COUNT(*) FROM team_members
        WHERE team_id = ?1 AND user_id != ?2 AND role = 'owner')",
    params![team_id, user_id],
    |row| Ok((row.get(0)?, row.get(1)?)),
  )?;
  Ok(is_owner && other_owners == 0)
}

fn ids<T: Copy + Into<i64>>(items: impl IntoIterator<Item = T>) -> Vec<i64> {
  items.into_iter().map(Into::into).collect()
}

// ─── AccessStore impl ────────────────────────────────────────────────────────

impl AccessStore for SqliteStore {
  type Error = crate::Error;

  async fn is_direct_owner(
    &self,
    stream_id: StreamId,
    user_id: UserId,
  ) -> Result<bool> {
    let (stream_id, user_id) = (stream_id.get(), user_id.get());
    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM streams WHERE stream_id = ?1 AND user_id = ?2",
              params![stream_id, user_id],
              |_| Ok(()),
            )
            .optional()?
            .is_some(),
        )
      })
      .await?;
    Ok(found)
  }

  async fn memberships_for_user(
    &self,
    user_id: UserId,
  ) -> Result<Vec<TeamMembership>> {
    let user_id = user_id.get();
    let raws: Vec<RawMembership> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MEMBER_COLUMNS} FROM team_members
           WHERE user_id = ?1
           ORDER BY team_id"
        ))?;
        let rows = stmt
          .query_map(params![user_id], RawMembership::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMembership::into_membership).collect()
  }

  async fn stream_team_relations(
    &self,
    stream_id: StreamId,
    team_ids: &[TeamId],
  ) -> Result<StreamTeamRelations> {
    let stream_id = stream_id.get();
    let team_ids = ids(team_ids.iter().copied());

    let (shares, owning): (Vec<(i64, String)>, Vec<i64>) = self
      .conn
      .call(move |conn| {
        let teams = id_array(team_ids);

        let mut stmt = conn.prepare(
          "SELECT team_id, access_level FROM team_stream_shares
           WHERE stream_id = ?1 AND team_id IN rarray(?2)",
        )?;
        let shares = stmt
          .query_map(params![stream_id, teams], |r| {
            Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT team_id FROM streams
           WHERE stream_id = ?1 AND team_id IN rarray(?2)",
        )?;
        let owning = stmt
          .query_map(params![stream_id, teams], |r| r.get::<_, i64>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((shares, owning))
      })
      .await?;

    let mut relations = StreamTeamRelations::default();
    for (team_id, level) in shares {
      let level: ShareLevel = decode_enum(&level, "share level")?;
      relations.shares.insert(TeamId::new(team_id)?, level);
    }
    for team_id in owning {
      relations.owning_teams.insert(TeamId::new(team_id)?);
    }
    Ok(relations)
  }

  async fn reachable_stream_ids(
    &self,
    user_id: UserId,
    team_ids: &[TeamId],
  ) -> Result<BTreeSet<StreamId>> {
    let user_id = user_id.get();
    let team_ids = ids(team_ids.iter().copied());

    let rows: Vec<i64> = self
      .conn
      .call(move |conn| {
        let teams = id_array(team_ids);
        let mut stmt = conn.prepare(
          "SELECT stream_id FROM streams WHERE user_id = ?1
           UNION
           SELECT stream_id FROM streams WHERE team_id IN rarray(?2)
           UNION
           SELECT stream_id FROM team_stream_shares WHERE team_id IN rarray(?2)",
        )?;
        let rows = stmt
          .query_map(params![user_id, teams], |r| r.get::<_, i64>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(StreamId::new)
        .collect::<churn_core::Result<_>>()?,
    )
  }
}

// ─── TenantStore impl ────────────────────────────────────────────────────────

impl TenantStore for SqliteStore {
  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, display_name: String) -> Result<User> {
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);
    let name = display_name.clone();

    let user_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (display_name, created_at) VALUES (?1, ?2)",
          params![name, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(User { user_id: UserId::new(user_id)?, display_name, created_at })
  }

  async fn get_user(&self, user_id: UserId) -> Result<Option<User>> {
    let user_id = user_id.get();
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
              params![user_id],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  // ── Streams ───────────────────────────────────────────────────────────────

  async fn add_stream(&self, input: NewStream) -> Result<Stream> {
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);
    let name = input.name.clone();
    let owner = input.owner_id.map(UserId::get);
    let team = input.team_id.map(TeamId::get);

    let stream_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO streams (name, user_id, team_id, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          params![name, owner, team, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Stream {
      stream_id: StreamId::new(stream_id)?,
      name: input.name,
      owner_id: input.owner_id,
      team_id: input.team_id,
      created_at,
    })
  }

  async fn get_stream(&self, stream_id: StreamId) -> Result<Option<Stream>> {
    self.query_stream(stream_id.get()).await
  }

  async fn get_streams(
    &self,
    stream_ids: &BTreeSet<StreamId>,
  ) -> Result<Vec<Stream>> {
    let stream_ids = ids(stream_ids.iter().copied());
    let raws: Vec<RawStream> = self
      .conn
      .call(move |conn| {
        let wanted = id_array(stream_ids);
        let mut stmt = conn.prepare(&format!(
          "SELECT {STREAM_COLUMNS} FROM streams
           WHERE stream_id IN rarray(?1)
           ORDER BY stream_id"
        ))?;
        let rows = stmt
          .query_map(params![wanted], RawStream::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStream::into_stream).collect()
  }

  async fn delete_stream(&self, stream_id: StreamId) -> Result<bool> {
    let stream_id = stream_id.get();
    // Contacts, their notes, and shares go with it via ON DELETE CASCADE.
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM streams WHERE stream_id = ?1",
          params![stream_id],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  // ── Teams ─────────────────────────────────────────────────────────────────

  async fn add_team(&self, name: String, creator: UserId) -> Result<Team> {
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);
    let team_name = name.clone();
    let creator = creator.get();
    let role = TeamRole::Owner.to_string();

    let team_id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO teams (name, created_at) VALUES (?1, ?2)",
          params![team_name, at_str],
        )?;
        let team_id = tx.last_insert_rowid();
        tx.execute(
          "INSERT INTO team_members (team_id, user_id, role, joined_at)
           VALUES (?1, ?2, ?3, ?4)",
          params![team_id, creator, role, at_str],
        )?;
        tx.commit()?;
        Ok(team_id)
      })
      .await?;

    Ok(Team { team_id: TeamId::new(team_id)?, name, created_at })
  }

  async fn get_team(&self, team_id: TeamId) -> Result<Option<Team>> {
    let team_id = team_id.get();
    let raw: Option<RawTeam> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {TEAM_COLUMNS} FROM teams WHERE team_id = ?1"),
              params![team_id],
              RawTeam::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawTeam::into_team).transpose()
  }

  async fn teams_for_user(&self, user_id: UserId) -> Result<Vec<MemberTeam>> {
    let user_id = user_id.get();
    let raws: Vec<(RawTeam, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT t.team_id, t.name, t.created_at, m.role
           FROM team_members m
           JOIN teams t ON t.team_id = m.team_id
           WHERE m.user_id = ?1
           ORDER BY t.team_id",
        )?;
        let rows = stmt
          .query_map(params![user_id], |row| {
            Ok((RawTeam::from_row(row)?, row.get(3)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(team, role)| {
        Ok(MemberTeam {
          team: team.into_team()?,
          role: decode_enum(&role, "team role")?,
        })
      })
      .collect()
  }

  async fn team_members(&self, team_id: TeamId) -> Result<Vec<TeamMembership>> {
    let team_id = team_id.get();
    let raws: Vec<RawMembership> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MEMBER_COLUMNS} FROM team_members
           WHERE team_id = ?1
           ORDER BY user_id"
        ))?;
        let rows = stmt
          .query_map(params![team_id], RawMembership::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMembership::into_membership).collect()
  }

  async fn set_member(
    &self,
    team_id: TeamId,
    user_id: UserId,
    role: TeamRole,
  ) -> Result<MemberChange<TeamMembership>> {
    let (team_id, user_id) = (team_id.get(), user_id.get());
    let demotes = role != TeamRole::Owner;
    let role = role.to_string();
    let at_str = encode_dt(Utc::now());

    let raw: Option<RawMembership> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if demotes && strands_team(&tx, team_id, user_id)? {
          return Ok(None);
        }
        let raw = tx.query_row(
          &format!(
            "INSERT INTO team_members (team_id, user_id, role, joined_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (team_id, user_id) DO UPDATE SET role = excluded.role
             RETURNING {MEMBER_COLUMNS}"
          ),
          params![team_id, user_id, role, at_str],
          RawMembership::from_row,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    match raw {
      Some(raw) => Ok(MemberChange::Applied(raw.into_membership()?)),
      None => Ok(MemberChange::LastOwner),
    }
  }

  async fn remove_member(
    &self,
    team_id: TeamId,
    user_id: UserId,
  ) -> Result<MemberChange<bool>> {
    let (team_id, user_id) = (team_id.get(), user_id.get());
    let change = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if strands_team(&tx, team_id, user_id)? {
          return Ok(MemberChange::LastOwner);
        }
        let removed = tx.execute(
          "DELETE FROM team_members WHERE team_id = ?1 AND user_id = ?2",
          params![team_id, user_id],
        )?;
        tx.commit()?;
        Ok(MemberChange::Applied(removed > 0))
      })
      .await?;
    Ok(change)
  }

  // ── Shares ────────────────────────────────────────────────────────────────

  async fn put_share(
    &self,
    stream_id: StreamId,
    team_id: TeamId,
    access_level: ShareLevel,
  ) -> Result<TeamStreamShare> {
    let (stream_id, team_id) = (stream_id.get(), team_id.get());
    let level = access_level.to_string();
    let at_str = encode_dt(Utc::now());

    let raw: RawShare = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!(
            "INSERT INTO team_stream_shares (team_id, stream_id, access_level, shared_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (team_id, stream_id) DO UPDATE SET
               access_level = excluded.access_level,
               shared_at    = excluded.shared_at
             RETURNING {SHARE_COLUMNS}"
          ),
          params![team_id, stream_id, level, at_str],
          RawShare::from_row,
        )?)
      })
      .await?;

    raw.into_share()
  }

  async fn remove_share(&self, stream_id: StreamId, team_id: TeamId) -> Result<bool> {
    let (stream_id, team_id) = (stream_id.get(), team_id.get());
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM team_stream_shares WHERE team_id = ?1 AND stream_id = ?2",
          params![team_id, stream_id],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn shares_for_stream(
    &self,
    stream_id: StreamId,
  ) -> Result<Vec<TeamStreamShare>> {
    let stream_id = stream_id.get();
    let raws: Vec<RawShare> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SHARE_COLUMNS} FROM team_stream_shares
           WHERE stream_id = ?1
           ORDER BY team_id"
        ))?;
        let rows = stmt
          .query_map(params![stream_id], RawShare::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawShare::into_share).collect()
  }

  // ── Contacts ──────────────────────────────────────────────────────────────

  async fn add_contact(&self, input: NewContact) -> Result<Contact> {
    let now = Utc::now();
    let at_str = encode_dt(now);
    let stream_id = input.stream_id.get();
    let (name, email, company) =
      (input.name.clone(), input.email.clone(), input.company.clone());

    let contact_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO contacts (stream_id, name, email, company, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          params![stream_id, name, email, company, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Contact {
      contact_id: ContactId::new(contact_id)?,
      stream_id:  input.stream_id,
      name:       input.name,
      email:      input.email,
      company:    input.company,
      created_at: now,
      updated_at: now,
    })
  }

  async fn get_contact(&self, contact_id: ContactId) -> Result<Option<Contact>> {
    let contact_id = contact_id.get();
    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE contact_id = ?1"),
              params![contact_id],
              RawContact::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawContact::into_contact).transpose()
  }

  async fn update_contact(
    &self,
    contact_id: ContactId,
    patch: ContactPatch,
  ) -> Result<Option<Contact>> {
    let contact_id = contact_id.get();
    let at_str = encode_dt(Utc::now());
    let (set_email, email) = (patch.email.is_some(), patch.email.flatten());
    let (set_company, company) =
      (patch.company.is_some(), patch.company.flatten());

    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "UPDATE contacts SET
                   name       = COALESCE(?2, name),
                   email      = CASE WHEN ?3 THEN ?4 ELSE email END,
                   company    = CASE WHEN ?5 THEN ?6 ELSE company END,
                   updated_at = ?7
                 WHERE contact_id = ?1
                 RETURNING {CONTACT_COLUMNS}"
              ),
              params![
                contact_id,
                patch.name,
                set_email,
                email,
                set_company,
                company,
                at_str
              ],
              RawContact::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawContact::into_contact).transpose()
  }

  async fn delete_contact(&self, contact_id: ContactId) -> Result<bool> {
    let contact_id = contact_id.get();
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM contacts WHERE contact_id = ?1",
          params![contact_id],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn search_contacts(&self, query: &ContactQuery) -> Result<Vec<Contact>> {
    if query.stream_ids.is_empty() {
      return Ok(Vec::new());
    }

    let stream_ids = ids(query.stream_ids.iter().copied());
    let text_pattern = query.text.as_deref().map(like_pattern);
    let limit_val = query.limit.unwrap_or(100) as i64;
    let offset_val = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawContact> = self
      .conn
      .call(move |conn| {
        let streams = id_array(stream_ids);
        let mut stmt = conn.prepare(&format!(
          "SELECT {CONTACT_COLUMNS} FROM contacts
           WHERE stream_id IN rarray(?1)
             AND (?2 IS NULL
                  OR name LIKE ?2 ESCAPE '\\'
                  OR email LIKE ?2 ESCAPE '\\'
                  OR company LIKE ?2 ESCAPE '\\')
           ORDER BY contact_id
           LIMIT ?3 OFFSET ?4"
        ))?;
        let rows = stmt
          .query_map(
            params![streams, text_pattern, limit_val, offset_val],
            RawContact::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawContact::into_contact).collect()
  }

  // ── Notes ─────────────────────────────────────────────────────────────────

  async fn add_note(&self, input: NewNote) -> Result<ContactNote> {
    let now = Utc::now();
    let at_str = encode_dt(now);
    let notify_str = encode_notify(&input.notify)?;
    let (contact_id, author_id) = (input.contact_id.get(), input.author_id.get());
    let (body, is_private) = (input.body.clone(), input.is_private);

    let note_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO contact_notes
             (contact_id, author_id, body, is_private, notify, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          params![contact_id, author_id, body, is_private, notify_str, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(ContactNote {
      note_id:    NoteId::new(note_id)?,
      contact_id: input.contact_id,
      author_id:  input.author_id,
      body:       input.body,
      is_private: input.is_private,
      notify:     input.notify,
      created_at: now,
      updated_at: now,
    })
  }

  async fn get_note(&self, note_id: NoteId) -> Result<Option<ContactNote>> {
    let note_id = note_id.get();
    let raw: Option<RawNote> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {NOTE_COLUMNS} FROM contact_notes WHERE note_id = ?1"),
              params![note_id],
              RawNote::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawNote::into_note).transpose()
  }

  async fn notes_for_contact(
    &self,
    contact_id: ContactId,
  ) -> Result<Vec<ContactNote>> {
    let contact_id = contact_id.get();
    let raws: Vec<RawNote> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {NOTE_COLUMNS} FROM contact_notes
           WHERE contact_id = ?1
           ORDER BY note_id"
        ))?;
        let rows = stmt
          .query_map(params![contact_id], RawNote::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNote::into_note).collect()
  }

  async fn update_note(
    &self,
    note_id: NoteId,
    patch: NotePatch,
  ) -> Result<Option<ContactNote>> {
    let note_id = note_id.get();
    let at_str = encode_dt(Utc::now());

    let raw: Option<RawNote> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "UPDATE contact_notes SET
                   body       = COALESCE(?2, body),
                   is_private = COALESCE(?3, is_private),
                   updated_at = ?4
                 WHERE note_id = ?1
                 RETURNING {NOTE_COLUMNS}"
              ),
              params![note_id, patch.body, patch.is_private, at_str],
              RawNote::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawNote::into_note).transpose()
  }

  async fn delete_note(&self, note_id: NoteId) -> Result<bool> {
    let note_id = note_id.get();
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM contact_notes WHERE note_id = ?1",
          params![note_id],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  // ── Cohorts ───────────────────────────────────────────────────────────────

  async fn add_cohort(&self, input: NewCohort) -> Result<Cohort> {
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);
    let (stream_id, created_by) = (input.stream_id.get(), input.created_by.get());
    let (name, description) = (input.name.clone(), input.description.clone());

    let cohort_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO cohorts (stream_id, name, description, created_by, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![stream_id, name, description, created_by, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Cohort {
      cohort_id: CohortId::new(cohort_id)?,
      stream_id: input.stream_id,
      name: input.name,
      description: input.description,
      created_by: input.created_by,
      created_at,
    })
  }

  async fn get_cohort(&self, cohort_id: CohortId) -> Result<Option<Cohort>> {
    let cohort_id = cohort_id.get();
    let raw: Option<RawCohort> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {COHORT_COLUMNS} FROM cohorts WHERE cohort_id = ?1"),
              params![cohort_id],
              RawCohort::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawCohort::into_cohort).transpose()
  }

  async fn list_cohorts(&self, stream_ids: &BTreeSet<StreamId>) -> Result<Vec<Cohort>> {
    if stream_ids.is_empty() {
      return Ok(Vec::new());
    }

    let stream_ids = ids(stream_ids.iter().copied());
    let raws: Vec<RawCohort> = self
      .conn
      .call(move |conn| {
        let streams = id_array(stream_ids);
        let mut stmt = conn.prepare(&format!(
          "SELECT {COHORT_COLUMNS} FROM cohorts
           WHERE stream_id IN rarray(?1)
           ORDER BY cohort_id"
        ))?;
        let rows = stmt
          .query_map(params![streams], RawCohort::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCohort::into_cohort).collect()
  }

  async fn delete_cohort(&self, cohort_id: CohortId) -> Result<bool> {
    let cohort_id = cohort_id.get();
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM cohorts WHERE cohort_id = ?1",
          params![cohort_id],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn add_cohort_member(
    &self,
    cohort_id: CohortId,
    contact_id: ContactId,
  ) -> Result<CohortMember> {
    let (cohort_id, contact_id) = (cohort_id.get(), contact_id.get());
    let at_str = encode_dt(Utc::now());

    let raw: RawCohortMember = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO cohort_members (cohort_id, contact_id, added_at)
           VALUES (?1, ?2, ?3)
           ON CONFLICT (cohort_id, contact_id) DO NOTHING",
          params![cohort_id, contact_id, at_str],
        )?;
        Ok(conn.query_row(
          "SELECT cohort_id, contact_id, added_at FROM cohort_members
           WHERE cohort_id = ?1 AND contact_id = ?2",
          params![cohort_id, contact_id],
          RawCohortMember::from_row,
        )?)
      })
      .await?;

    raw.into_member()
  }

  async fn remove_cohort_member(
    &self,
    cohort_id: CohortId,
    contact_id: ContactId,
  ) -> Result<bool> {
    let (cohort_id, contact_id) = (cohort_id.get(), contact_id.get());
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM cohort_members WHERE cohort_id = ?1 AND contact_id = ?2",
          params![cohort_id, contact_id],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn cohort_contacts(&self, cohort_id: CohortId) -> Result<Vec<Contact>> {
    let cohort_id = cohort_id.get();
    let raws: Vec<RawContact> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT c.contact_id, c.stream_id, c.name, c.email, c.company,
                  c.created_at, c.updated_at
           FROM cohort_members m
           JOIN contacts c ON c.contact_id = m.contact_id
           WHERE m.cohort_id = ?1
           ORDER BY c.contact_id",
        )?;
        let rows = stmt
          .query_map(params![cohort_id], RawContact::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawContact::into_contact).collect()
  }
}

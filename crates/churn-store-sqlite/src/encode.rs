//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Ids are stored as `INTEGER`, timestamps as RFC 3339 strings, enums as
//! their lowercase names, and note recipients as a compact JSON array.

use std::{rc::Rc, str::FromStr};

use chrono::{DateTime, Utc};
use churn_core::{
  CohortId, ContactId, NoteId, StreamId, TeamId, UserId,
  cohort::{Cohort, CohortMember},
  contact::{Contact, ContactNote},
  stream::Stream,
  team::{Team, TeamMembership, TeamStreamShare, User},
};
use rusqlite::{Row, types::Value};

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(e.to_string()))
}

/// Parse an enum stored by its lowercase name.
pub fn decode_enum<T: FromStr>(s: &str, what: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown {what}: {s:?}")))
}

pub fn encode_notify(ids: &[UserId]) -> Result<String> {
  Ok(serde_json::to_string(ids)?)
}

pub fn decode_notify(s: &str) -> Result<Vec<UserId>> {
  Ok(serde_json::from_str(s)?)
}

/// Wrap free text as a `LIKE ... ESCAPE '\'` substring pattern. Wildcards
/// typed by the user match themselves.
pub fn like_pattern(text: &str) -> String {
  let mut pattern = String::with_capacity(text.len() + 2);
  pattern.push('%');
  for c in text.chars() {
    if matches!(c, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

/// Build the value bound to an `IN rarray(?N)` parameter.
///
/// Must be called inside the connection closure; the result is not `Send`.
pub fn id_array(ids: Vec<i64>) -> Rc<Vec<Value>> {
  Rc::new(ids.into_iter().map(Value::from).collect())
}

// ─── Column lists ────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "user_id, display_name, created_at";
pub const STREAM_COLUMNS: &str = "stream_id, name, user_id, team_id, created_at";
pub const TEAM_COLUMNS: &str = "team_id, name, created_at";
pub const MEMBER_COLUMNS: &str = "team_id, user_id, role, joined_at";
pub const SHARE_COLUMNS: &str = "team_id, stream_id, access_level, shared_at";
pub const CONTACT_COLUMNS: &str =
  "contact_id, stream_id, name, email, company, created_at, updated_at";
pub const COHORT_COLUMNS: &str =
  "cohort_id, stream_id, name, description, created_by, created_at";
pub const NOTE_COLUMNS: &str = "note_id, contact_id, author_id, body, \
                                is_private, notify, created_at, updated_at";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:      i64,
  pub display_name: String,
  pub created_at:   String,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:      row.get(0)?,
      display_name: row.get(1)?,
      created_at:   row.get(2)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:      UserId::new(self.user_id)?,
      display_name: self.display_name,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `streams` row.
pub struct RawStream {
  pub stream_id:  i64,
  pub name:       String,
  pub user_id:    Option<i64>,
  pub team_id:    Option<i64>,
  pub created_at: String,
}

impl RawStream {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      stream_id:  row.get(0)?,
      name:       row.get(1)?,
      user_id:    row.get(2)?,
      team_id:    row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_stream(self) -> Result<Stream> {
    Ok(Stream {
      stream_id:  StreamId::new(self.stream_id)?,
      name:       self.name,
      owner_id:   self.user_id.map(UserId::new).transpose()?,
      team_id:    self.team_id.map(TeamId::new).transpose()?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawTeam {
  pub team_id:    i64,
  pub name:       String,
  pub created_at: String,
}

impl RawTeam {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      team_id:    row.get(0)?,
      name:       row.get(1)?,
      created_at: row.get(2)?,
    })
  }

  pub fn into_team(self) -> Result<Team> {
    Ok(Team {
      team_id:    TeamId::new(self.team_id)?,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawMembership {
  pub team_id:   i64,
  pub user_id:   i64,
  pub role:      String,
  pub joined_at: String,
}

impl RawMembership {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      team_id:   row.get(0)?,
      user_id:   row.get(1)?,
      role:      row.get(2)?,
      joined_at: row.get(3)?,
    })
  }

  pub fn into_membership(self) -> Result<TeamMembership> {
    Ok(TeamMembership {
      team_id:   TeamId::new(self.team_id)?,
      user_id:   UserId::new(self.user_id)?,
      role:      decode_enum(&self.role, "team role")?,
      joined_at: decode_dt(&self.joined_at)?,
    })
  }
}

pub struct RawShare {
  pub team_id:      i64,
  pub stream_id:    i64,
  pub access_level: String,
  pub shared_at:    String,
}

impl RawShare {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      team_id:      row.get(0)?,
      stream_id:    row.get(1)?,
      access_level: row.get(2)?,
      shared_at:    row.get(3)?,
    })
  }

  pub fn into_share(self) -> Result<TeamStreamShare> {
    Ok(TeamStreamShare {
      team_id:      TeamId::new(self.team_id)?,
      stream_id:    StreamId::new(self.stream_id)?,
      access_level: decode_enum(&self.access_level, "share level")?,
      shared_at:    decode_dt(&self.shared_at)?,
    })
  }
}

pub struct RawContact {
  pub contact_id: i64,
  pub stream_id:  i64,
  pub name:       String,
  pub email:      Option<String>,
  pub company:    Option<String>,
  pub created_at: String,
  pub updated_at: String,
}

impl RawContact {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      contact_id: row.get(0)?,
      stream_id:  row.get(1)?,
      name:       row.get(2)?,
      email:      row.get(3)?,
      company:    row.get(4)?,
      created_at: row.get(5)?,
      updated_at: row.get(6)?,
    })
  }

  pub fn into_contact(self) -> Result<Contact> {
    Ok(Contact {
      contact_id: ContactId::new(self.contact_id)?,
      stream_id:  StreamId::new(self.stream_id)?,
      name:       self.name,
      email:      self.email,
      company:    self.company,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawNote {
  pub note_id:    i64,
  pub contact_id: i64,
  pub author_id:  i64,
  pub body:       String,
  pub is_private: bool,
  pub notify:     String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawNote {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      note_id:    row.get(0)?,
      contact_id: row.get(1)?,
      author_id:  row.get(2)?,
      body:       row.get(3)?,
      is_private: row.get(4)?,
      notify:     row.get(5)?,
      created_at: row.get(6)?,
      updated_at: row.get(7)?,
    })
  }

  pub fn into_note(self) -> Result<ContactNote> {
    Ok(ContactNote {
      note_id:    NoteId::new(self.note_id)?,
      contact_id: ContactId::new(self.contact_id)?,
      author_id:  UserId::new(self.author_id)?,
      body:       self.body,
      is_private: self.is_private,
      notify:     decode_notify(&self.notify)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawCohort {
  pub cohort_id:   i64,
  pub stream_id:   i64,
  pub name:        String,
  pub description: Option<String>,
  pub created_by:  i64,
  pub created_at:  String,
}

impl RawCohort {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      cohort_id:   row.get(0)?,
      stream_id:   row.get(1)?,
      name:        row.get(2)?,
      description: row.get(3)?,
      created_by:  row.get(4)?,
      created_at:  row.get(5)?,
    })
  }

  pub fn into_cohort(self) -> Result<Cohort> {
    Ok(Cohort {
      cohort_id:   CohortId::new(self.cohort_id)?,
      stream_id:   StreamId::new(self.stream_id)?,
      name:        self.name,
      description: self.description,
      created_by:  UserId::new(self.created_by)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawCohortMember {
  pub cohort_id:  i64,
  pub contact_id: i64,
  pub added_at:   String,
}

impl RawCohortMember {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      cohort_id:  row.get(0)?,
      contact_id: row.get(1)?,
      added_at:   row.get(2)?,
    })
  }

  pub fn into_member(self) -> Result<CohortMember> {
    Ok(CohortMember {
      cohort_id:  CohortId::new(self.cohort_id)?,
      contact_id: ContactId::new(self.contact_id)?,
      added_at:   decode_dt(&self.added_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::like_pattern;

  #[test]
  fn like_pattern_escapes_wildcards() {
    assert_eq!(like_pattern("acme"), "%acme%");
    assert_eq!(like_pattern("100%"), "%100\\%%");
    assert_eq!(like_pattern("a_b"), "%a\\_b%");
    assert_eq!(like_pattern("c:\\x"), "%c:\\\\x%");
  }
}

//! Contacts and the notes recorded against them.
//!
//! Both are dependent resources: every permission check on them is a check
//! on the owning stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::id::{ContactId, NoteId, StreamId, UserId};

// ─── Contacts ────────────────────────────────────────────────────────────────

/// A customer tracked within exactly one stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
  pub contact_id: ContactId,
  pub stream_id:  StreamId,
  pub name:       String,
  pub email:      Option<String>,
  pub company:    Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Input to [`crate::store::TenantStore::add_contact`].
#[derive(Debug, Clone)]
pub struct NewContact {
  pub stream_id: StreamId,
  pub name:      String,
  pub email:     Option<String>,
  pub company:   Option<String>,
}

/// Partial update. An absent field is left unchanged; for the optional
/// fields `Some(None)` (JSON `null`) clears the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactPatch {
  pub name:    Option<String>,
  #[serde(default, deserialize_with = "present")]
  pub email:   Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub company: Option<Option<String>>,
}

/// Marks a field that appeared in the input, even as `null`.
fn present<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  T::deserialize(de).map(Some)
}

// ─── Notes ───────────────────────────────────────────────────────────────────

/// A free-text note on a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactNote {
  pub note_id:    NoteId,
  pub contact_id: ContactId,
  pub author_id:  UserId,
  pub body:       String,
  /// Private notes are only listed for their author.
  pub is_private: bool,
  /// Users to be told about the note. Delivery happens elsewhere.
  pub notify:     Vec<UserId>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl ContactNote {
  pub fn visible_to(&self, user_id: UserId) -> bool {
    !self.is_private || self.author_id == user_id
  }
}

/// Input to [`crate::store::TenantStore::add_note`].
#[derive(Debug, Clone)]
pub struct NewNote {
  pub contact_id: ContactId,
  pub author_id:  UserId,
  pub body:       String,
  pub is_private: bool,
  pub notify:     Vec<UserId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotePatch {
  pub body:       Option<String>,
  pub is_private: Option<bool>,
}

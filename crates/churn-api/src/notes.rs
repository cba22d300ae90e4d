//! Handlers for contact notes.
//!
//! | Method   | Path                   | Gate                               |
//! |----------|------------------------|------------------------------------|
//! | `GET`    | `/contacts/{id}/notes` | view; private notes author-only    |
//! | `POST`   | `/contacts/{id}/notes` | add                                |
//! | `PATCH`  | `/notes/{id}`          | edit; privacy author-only          |
//! | `DELETE` | `/notes/{id}`          | delete                             |
//!
//! A private note is indistinguishable from a missing one for anyone but its
//! author.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use churn_core::{
  AccessResolver, Action, ContactId, NoteId, UserId,
  contact::{ContactNote, NewNote, NotePatch},
  store::TenantStore,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
  auth::CurrentUser,
  error::ApiError,
  guard::{self, non_blank},
};

/// Load a note visible to `user_id` and require `action` on its stream.
async fn visible_note<S: TenantStore>(
  store: &S,
  user_id: UserId,
  note_id: NoteId,
  action: Action,
) -> Result<ContactNote, ApiError> {
  let note = store
    .get_note(note_id)
    .await
    .map_err(ApiError::store)?
    .filter(|n| n.visible_to(user_id))
    .ok_or(ApiError::NotFound)?;
  guard::contact(store, user_id, note.contact_id, action).await?;
  Ok(note)
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /contacts/{id}/notes`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(contact_id): Path<ContactId>,
) -> Result<Json<Vec<ContactNote>>, ApiError>
where
  S: TenantStore,
{
  guard::contact(store.as_ref(), user_id, contact_id, Action::View).await?;
  let notes = store
    .notes_for_contact(contact_id)
    .await
    .map_err(ApiError::store)?
    .into_iter()
    .filter(|n| n.visible_to(user_id))
    .collect();
  Ok(Json(notes))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub body:       String,
  #[serde(default)]
  pub is_private: bool,
  #[serde(default)]
  pub notify:     Vec<UserId>,
}

/// `POST /contacts/{id}/notes`: body: `{"body":"...","notify":[2,3]}`
///
/// Recipients without view access to the stream are dropped.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(contact_id): Path<ContactId>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TenantStore,
{
  let text = non_blank("body", body.body)?;
  let (contact, _) =
    guard::contact(store.as_ref(), user_id, contact_id, Action::Add).await?;

  let resolver = AccessResolver::new(store.as_ref());
  let mut notify = Vec::with_capacity(body.notify.len());
  for recipient in body.notify {
    if notify.contains(&recipient) {
      continue;
    }
    if resolver
      .has_at_least_view_access(recipient, contact.stream_id)
      .await?
    {
      notify.push(recipient);
    } else {
      debug!(%recipient, stream_id = %contact.stream_id, "recipient dropped");
    }
  }

  let note = store
    .add_note(NewNote {
      contact_id,
      author_id: user_id,
      body: text,
      is_private: body.is_private,
      notify,
    })
    .await
    .map_err(ApiError::store)?;
  info!(%user_id, %contact_id, note_id = %note.note_id, "note added");
  Ok((StatusCode::CREATED, Json(note)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /notes/{id}`: body: `{"body":"...","is_private":true}`
///
/// Editors may change the text; only the author may change `is_private`.
pub async fn update<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(note_id): Path<NoteId>,
  Json(patch): Json<NotePatch>,
) -> Result<Json<ContactNote>, ApiError>
where
  S: TenantStore,
{
  let body = patch.body.map(|b| non_blank("body", b)).transpose()?;
  let note = visible_note(store.as_ref(), user_id, note_id, Action::Edit).await?;
  if patch.is_private.is_some() && note.author_id != user_id {
    return Err(ApiError::Forbidden(
      "only the author may change a note's privacy".to_owned(),
    ));
  }

  let note = store
    .update_note(note_id, NotePatch { body, is_private: patch.is_private })
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::NotFound)?;
  Ok(Json(note))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /notes/{id}`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(note_id): Path<NoteId>,
) -> Result<StatusCode, ApiError>
where
  S: TenantStore,
{
  visible_note(store.as_ref(), user_id, note_id, Action::Delete).await?;
  if !store.delete_note(note_id).await.map_err(ApiError::store)? {
    return Err(ApiError::NotFound);
  }
  info!(%user_id, %note_id, "note deleted");
  Ok(StatusCode::NO_CONTENT)
}

//! Handlers for `/contacts` endpoints.
//!
//! Every check is made against the stream the contact belongs to.
//!
//! | Method   | Path             | Gate                                   |
//! |----------|------------------|----------------------------------------|
//! | `GET`    | `/contacts`      | `?stream_id=&text=&limit=&offset=`     |
//! | `POST`   | `/contacts`      | add                                    |
//! | `GET`    | `/contacts/{id}` | view                                   |
//! | `PATCH`  | `/contacts/{id}` | edit                                   |
//! | `DELETE` | `/contacts/{id}` | delete; notes go with it               |

use std::{collections::BTreeSet, sync::Arc};

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use churn_core::{
  AccessResolver, Action, ContactId, StreamId,
  contact::{Contact, ContactPatch, NewContact},
  store::{ContactQuery, TenantStore},
};
use serde::Deserialize;
use tracing::info;

use crate::{
  auth::CurrentUser,
  error::ApiError,
  guard::{self, non_blank, require},
};

/// Upper bound on `limit`.
const MAX_PAGE: usize = 500;

/// Trim an optional text field; blank becomes `None`.
fn optional(value: Option<String>) -> Option<String> {
  value
    .map(|v| v.trim().to_owned())
    .filter(|v| !v.is_empty())
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub stream_id: Option<StreamId>,
  pub text:      Option<String>,
  pub limit:     Option<usize>,
  pub offset:    Option<usize>,
}

/// `GET /contacts`: scoped to the caller's accessible streams, or to a
/// single one when `stream_id` is given.
pub async fn list<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Contact>>, ApiError>
where
  S: TenantStore,
{
  let stream_ids = match params.stream_id {
    Some(stream_id) => {
      require(store.as_ref(), user_id, stream_id, Action::View).await?;
      BTreeSet::from([stream_id])
    }
    None => {
      AccessResolver::new(store.as_ref())
        .list_accessible_stream_ids(user_id)
        .await?
    }
  };

  let query = ContactQuery {
    stream_ids,
    text: optional(params.text),
    limit: Some(params.limit.unwrap_or(MAX_PAGE).min(MAX_PAGE)),
    offset: params.offset,
  };
  let contacts = store
    .search_contacts(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(contacts))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub stream_id: StreamId,
  pub name:      String,
  pub email:     Option<String>,
  pub company:   Option<String>,
}

/// `POST /contacts`: body: `{"stream_id":1,"name":"...","email":"..."}`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TenantStore,
{
  let name = non_blank("name", body.name)?;
  require(store.as_ref(), user_id, body.stream_id, Action::Add).await?;

  let contact = store
    .add_contact(NewContact {
      stream_id: body.stream_id,
      name,
      email: optional(body.email),
      company: optional(body.company),
    })
    .await
    .map_err(ApiError::store)?;
  info!(%user_id, contact_id = %contact.contact_id, "contact created");
  Ok((StatusCode::CREATED, Json(contact)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /contacts/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(contact_id): Path<ContactId>,
) -> Result<Json<Contact>, ApiError>
where
  S: TenantStore,
{
  let (contact, _) =
    guard::contact(store.as_ref(), user_id, contact_id, Action::View).await?;
  Ok(Json(contact))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /contacts/{id}`: absent fields are left unchanged. `email` and
/// `company` are cleared by `null` or an empty string.
pub async fn update<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(contact_id): Path<ContactId>,
  Json(patch): Json<ContactPatch>,
) -> Result<Json<Contact>, ApiError>
where
  S: TenantStore,
{
  let name = patch.name.map(|n| non_blank("name", n)).transpose()?;
  guard::contact(store.as_ref(), user_id, contact_id, Action::Edit).await?;

  let patch = ContactPatch {
    name,
    email: patch.email.map(optional),
    company: patch.company.map(optional),
  };
  let contact = store
    .update_contact(contact_id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::NotFound)?;
  Ok(Json(contact))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /contacts/{id}`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(contact_id): Path<ContactId>,
) -> Result<StatusCode, ApiError>
where
  S: TenantStore,
{
  guard::contact(store.as_ref(), user_id, contact_id, Action::Delete).await?;
  if !store
    .delete_contact(contact_id)
    .await
    .map_err(ApiError::store)?
  {
    return Err(ApiError::NotFound);
  }
  info!(%user_id, %contact_id, "contact deleted");
  Ok(StatusCode::NO_CONTENT)
}

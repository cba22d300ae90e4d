//! Handler for `POST /users`.
//!
//! Account creation proper belongs to the signup flow; this endpoint only
//! registers the identity the rest of the API refers to.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use churn_core::store::TenantStore;
use serde::Deserialize;

use crate::{error::ApiError, guard::non_blank};

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub display_name: String,
}

/// `POST /users`: body: `{"display_name":"..."}`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TenantStore,
{
  let name = non_blank("display_name", body.display_name)?;
  let user = store.add_user(name).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(user)))
}

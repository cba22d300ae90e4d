//! JSON REST API for Churn Analytics Pro.
//!
//! Exposes an axum [`Router`] backed by any [`churn_core::store::TenantStore`].
//! Every handler resolves the caller's access through
//! [`churn_core::AccessResolver`] before touching stream data.
//!
//! The caller is identified by the [`auth::USER_HEADER`] header, which the
//! authentication layer in front of this router is expected to set.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", churn_api::api_router(store.clone()))
//! ```

pub mod auth;
pub mod cohorts;
pub mod contacts;
pub mod error;
pub mod guard;
pub mod notes;
pub mod streams;
pub mod teams;
pub mod users;


use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch, post, put},
};
use churn_core::store::TenantStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: TenantStore + 'static,
{
  Router::new()
    // Users
    .route("/users", post(users::create::<S>))
    // Streams
    .route("/streams", get(streams::list::<S>).post(streams::create::<S>))
    .route(
      "/streams/{id}",
      get(streams::get_one::<S>).delete(streams::delete_one::<S>),
    )
    .route("/streams/{id}/access", get(streams::access::<S>))
    .route("/streams/{id}/shares", get(streams::list_shares::<S>))
    .route(
      "/streams/{id}/shares/{team}",
      put(streams::put_share::<S>).delete(streams::delete_share::<S>),
    )
    // Teams
    .route("/teams", get(teams::list::<S>).post(teams::create::<S>))
    .route("/teams/{id}/members", get(teams::list_members::<S>))
    .route(
      "/teams/{id}/members/{user}",
      put(teams::put_member::<S>).delete(teams::delete_member::<S>),
    )
    // Contacts
    .route(
      "/contacts",
      get(contacts::list::<S>).post(contacts::create::<S>),
    )
    .route(
      "/contacts/{id}",
      get(contacts::get_one::<S>)
        .patch(contacts::update::<S>)
        .delete(contacts::delete_one::<S>),
    )
    // Cohorts
    .route("/cohorts", get(cohorts::list::<S>).post(cohorts::create::<S>))
    .route(
      "/cohorts/{id}",
      get(cohorts::get_one::<S>).delete(cohorts::delete_one::<S>),
    )
    .route("/cohorts/{id}/members", get(cohorts::list_members::<S>))
    .route(
      "/cohorts/{id}/members/{contact}",
      put(cohorts::put_member::<S>).delete(cohorts::delete_member::<S>),
    )
    // Notes
    .route(
      "/contacts/{id}/notes",
      get(notes::list::<S>).post(notes::create::<S>),
    )
    .route(
      "/notes/{id}",
      patch(notes::update::<S>).delete(notes::delete_one::<S>),
    )
    .with_state(store)
}

//! Core types and trait definitions for Churn Analytics Pro.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the stream access-control model: the [`resolver::AccessResolver`] and the
//! store traits it reads through.

pub mod access;
pub mod cohort;
pub mod contact;
pub mod error;
pub mod id;
pub mod resolver;
pub mod store;
pub mod stream;
pub mod team;

pub use access::{AccessLevel, Action, ShareLevel, TeamRole};
pub use error::{Error, Result};
pub use id::{CohortId, ContactId, NoteId, StreamId, TeamId, UserId};
pub use resolver::AccessResolver;

#[cfg(test)]
mod tests;

//! SQLite backend for Churn Analytics Pro.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Set-valued filters bind through the
//! `rarray` table-valued function rather than generated placeholder lists.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

//! Error types for `churn-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// An identifier or argument was rejected before any lookup took place.
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  /// The backing store failed. Never downgraded to an access denial.
  #[error("store unavailable: {0}")]
  StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::StoreUnavailable(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

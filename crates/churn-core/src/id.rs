//! Integer identifiers for every entity in the store.
//!
//! Ids are opaque positive integers. Construction rejects zero and negative
//! values with [`Error::InvalidArgument`], so a value of one of these types
//! is always safe to hand to a store lookup.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

macro_rules! define_id {
  ($(#[$meta:meta])* $name:ident, $label:literal) => {
    $(#[$meta])*
    #[derive(
      Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    )]
    #[serde(try_from = "i64", into = "i64")]
    pub struct $name(i64);

    impl $name {
      /// Validate a raw id; non-positive values are rejected.
      pub fn new(raw: i64) -> Result<Self> {
        if raw > 0 {
          Ok(Self(raw))
        } else {
          Err(Error::InvalidArgument(format!(
            "{} must be a positive integer, got {raw}",
            $label
          )))
        }
      }

      pub fn get(self) -> i64 { self.0 }
    }

    impl TryFrom<i64> for $name {
      type Error = Error;

      fn try_from(raw: i64) -> Result<Self> { Self::new(raw) }
    }

    impl From<$name> for i64 {
      fn from(id: $name) -> i64 { id.0 }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
      }
    }

    impl FromStr for $name {
      type Err = Error;

      fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim().parse::<i64>().map_err(|_| {
          Error::InvalidArgument(format!("{} is not an integer: {s:?}", $label))
        })?;
        Self::new(raw)
      }
    }
  };
}

define_id!(
  /// Identity of an account holder, supplied by the login layer.
  UserId,
  "user id"
);
define_id!(
  /// A tenant-owned data source or product.
  StreamId,
  "stream id"
);
define_id!(TeamId, "team id");
define_id!(ContactId, "contact id");
define_id!(NoteId, "note id");
define_id!(CohortId, "cohort id");

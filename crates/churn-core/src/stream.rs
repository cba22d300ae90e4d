//! Streams: the tenant-owned resources that access control is computed for.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  access::AccessLevel,
  id::{StreamId, TeamId, UserId},
};

/// A data source or product whose contacts are tracked for churn risk.
///
/// `owner_id` and `team_id` may both be set. Direct ownership takes
/// precedence during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
  pub stream_id:  StreamId,
  pub name:       String,
  /// The direct owner; the only principal ever resolved to `owner`.
  pub owner_id:   Option<UserId>,
  /// The team the stream was created under, if any.
  pub team_id:    Option<TeamId>,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::TenantStore::add_stream`].
#[derive(Debug, Clone)]
pub struct NewStream {
  pub name:     String,
  pub owner_id: Option<UserId>,
  pub team_id:  Option<TeamId>,
}

/// A stream together with the caller's effective level on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamAccess {
  pub stream: Stream,
  pub access: AccessLevel,
}

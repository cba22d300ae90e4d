//! Cohorts: named groups of contacts within a single stream.
//!
//! A cohort and its memberships are dependent resources of the stream, so
//! they are gated exactly like contacts and disappear with the stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{CohortId, ContactId, StreamId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cohort {
  pub cohort_id:   CohortId,
  pub stream_id:   StreamId,
  pub name:        String,
  pub description: Option<String>,
  pub created_by:  UserId,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::TenantStore::add_cohort`].
#[derive(Debug, Clone)]
pub struct NewCohort {
  pub stream_id:   StreamId,
  pub name:        String,
  pub description: Option<String>,
  pub created_by:  UserId,
}

/// A contact's membership in a cohort. Unique per (cohort, contact).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortMember {
  pub cohort_id:  CohortId,
  pub contact_id: ContactId,
  pub added_at:   DateTime<Utc>,
}

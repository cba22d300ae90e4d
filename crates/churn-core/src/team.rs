//! Teams, memberships, and explicit team-to-stream shares.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  access::{ShareLevel, TeamRole},
  id::{StreamId, TeamId, UserId},
};

/// An account holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:      UserId,
  pub display_name: String,
  pub created_at:   DateTime<Utc>,
}

/// A named group of users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
  pub team_id:    TeamId,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

/// A (team, user, role) tuple. Unique per (team, user).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMembership {
  pub team_id:   TeamId,
  pub user_id:   UserId,
  pub role:      TeamRole,
  pub joined_at: DateTime<Utc>,
}

/// A team as seen by one of its members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberTeam {
  pub team: Team,
  pub role: TeamRole,
}

/// An explicit grant of a stream to a team. Unique per (team, stream).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStreamShare {
  pub team_id:      TeamId,
  pub stream_id:    StreamId,
  pub access_level: ShareLevel,
  pub shared_at:    DateTime<Utc>,
}

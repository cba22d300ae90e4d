//! Access levels, team roles, share levels, and the rule that combines them.
//!
//! Nothing in this module touches a store. [`effective_level`] is the pure
//! decision function; [`crate::resolver::AccessResolver`] gathers its inputs.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::id::TeamId;

// ─── Access level ────────────────────────────────────────────────────────────

/// A user's effective access to a stream.
///
/// Variants are declared in ascending order so that `Ord` encodes precedence:
/// `owner > editor > viewer > none`.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AccessLevel {
  #[default]
  None,
  Viewer,
  Editor,
  Owner,
}

impl AccessLevel {
  /// Any level other than `none` may read stream data.
  pub fn can_view(self) -> bool { self != Self::None }

  /// View access is sufficient to contribute contacts and notes.
  pub fn can_add(self) -> bool { self >= Self::Viewer }

  pub fn can_edit(self) -> bool { self >= Self::Editor }

  /// Deletion is reserved for the direct owner.
  pub fn can_delete(self) -> bool { self == Self::Owner }

  /// Sharing a stream with teams is an owner decision as well.
  pub fn can_manage(self) -> bool { self == Self::Owner }

  pub fn allows(self, action: Action) -> bool {
    match action {
      Action::View => self.can_view(),
      Action::Add => self.can_add(),
      Action::Edit => self.can_edit(),
      Action::Delete => self.can_delete(),
      Action::Manage => self.can_manage(),
    }
  }
}

/// An operation on a stream or one of its dependent resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Action {
  View,
  Add,
  Edit,
  Delete,
  /// Change who the stream is shared with.
  Manage,
}

// ─── Team relations ──────────────────────────────────────────────────────────

/// A member's role within a team.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TeamRole {
  Owner,
  Editor,
  Viewer,
}

impl TeamRole {
  /// Roles that may carry `editor` access into a stream.
  pub fn can_write(self) -> bool { matches!(self, Self::Owner | Self::Editor) }
}

/// The access level recorded on an explicit team-to-stream share.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ShareLevel {
  View,
  Edit,
}

/// Everything one of the user's teams says about one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamGrant {
  pub team_id:     TeamId,
  /// The user's role in this team.
  pub role:        TeamRole,
  /// Whether `stream.team_id == team_id`.
  pub owns_stream: bool,
  /// The team's explicit share on the stream, if one exists.
  pub share:       Option<ShareLevel>,
}

impl TeamGrant {
  /// The level this single team contributes.
  ///
  /// `editor` requires a writing role together with either an `edit` share or
  /// team ownership of the stream. Any other relation yields `viewer`.
  pub fn contribution(&self) -> AccessLevel {
    if !self.owns_stream && self.share.is_none() {
      return AccessLevel::None;
    }
    let edit_path = self.owns_stream || self.share == Some(ShareLevel::Edit);
    if self.role.can_write() && edit_path {
      AccessLevel::Editor
    } else {
      AccessLevel::Viewer
    }
  }
}

/// Combine direct ownership and every team grant into one level.
///
/// Direct ownership is absolute. Otherwise the highest team contribution
/// wins, regardless of the order the grants arrive in.
pub fn effective_level(direct_owner: bool, grants: &[TeamGrant]) -> AccessLevel {
  if direct_owner {
    return AccessLevel::Owner;
  }
  grants
    .iter()
    .map(TeamGrant::contribution)
    .max()
    .unwrap_or(AccessLevel::None)
}

#[cfg(test)]
mod tests {
  use super::*;

  const ALL_LEVELS: [AccessLevel; 4] = [
    AccessLevel::None,
    AccessLevel::Viewer,
    AccessLevel::Editor,
    AccessLevel::Owner,
  ];

  fn team(n: i64) -> TeamId { TeamId::new(n).unwrap() }

  fn grant(
    role: TeamRole,
    owns_stream: bool,
    share: Option<ShareLevel>,
  ) -> TeamGrant {
    TeamGrant { team_id: team(1), role, owns_stream, share }
  }

  #[test]
  fn precedence_order() {
    assert!(AccessLevel::Owner > AccessLevel::Editor);
    assert!(AccessLevel::Editor > AccessLevel::Viewer);
    assert!(AccessLevel::Viewer > AccessLevel::None);
  }

  #[test]
  fn action_gates_are_nested() {
    for level in ALL_LEVELS {
      if level.can_delete() {
        assert!(level.can_edit(), "{level}: delete without edit");
      }
      if level.can_edit() {
        assert!(level.can_add(), "{level}: edit without add");
      }
    }
  }

  #[test]
  fn action_gates_per_level() {
    let table = [
      (AccessLevel::Owner, [true, true, true]),
      (AccessLevel::Editor, [true, true, false]),
      (AccessLevel::Viewer, [true, false, false]),
      (AccessLevel::None, [false, false, false]),
    ];
    for (level, [add, edit, delete]) in table {
      assert_eq!(level.can_add(), add, "{level} add");
      assert_eq!(level.can_edit(), edit, "{level} edit");
      assert_eq!(level.can_delete(), delete, "{level} delete");
      assert_eq!(level.allows(Action::View), level != AccessLevel::None);
      assert_eq!(level.allows(Action::Manage), delete);
    }
  }

  #[test]
  fn text_forms() {
    assert_eq!(AccessLevel::Viewer.to_string(), "viewer");
    assert_eq!("edit".parse::<ShareLevel>().unwrap(), ShareLevel::Edit);
    assert_eq!(TeamRole::Editor.as_ref(), "editor");
    assert!("admin".parse::<TeamRole>().is_err());
  }

  #[test]
  fn unrelated_team_contributes_nothing() {
    assert_eq!(
      grant(TeamRole::Owner, false, None).contribution(),
      AccessLevel::None
    );
  }

  #[test]
  fn writing_role_with_edit_share_is_editor() {
    for role in [TeamRole::Owner, TeamRole::Editor] {
      assert_eq!(
        grant(role, false, Some(ShareLevel::Edit)).contribution(),
        AccessLevel::Editor
      );
    }
  }

  #[test]
  fn team_ownership_with_writing_role_is_editor() {
    assert_eq!(
      grant(TeamRole::Editor, true, None).contribution(),
      AccessLevel::Editor
    );
    assert_eq!(
      grant(TeamRole::Owner, true, Some(ShareLevel::View)).contribution(),
      AccessLevel::Editor
    );
  }

  #[test]
  fn viewer_role_never_exceeds_viewer() {
    for (owns, share) in [
      (true, None),
      (false, Some(ShareLevel::Edit)),
      (true, Some(ShareLevel::Edit)),
      (false, Some(ShareLevel::View)),
    ] {
      assert_eq!(
        grant(TeamRole::Viewer, owns, share).contribution(),
        AccessLevel::Viewer
      );
    }
  }

  #[test]
  fn view_share_caps_owner_role() {
    assert_eq!(
      grant(TeamRole::Owner, false, Some(ShareLevel::View)).contribution(),
      AccessLevel::Viewer
    );
  }

  #[test]
  fn highest_grant_wins_in_any_order() {
    let a = TeamGrant {
      team_id:     team(1),
      role:        TeamRole::Owner,
      owns_stream: false,
      share:       Some(ShareLevel::View),
    };
    let b = TeamGrant {
      team_id:     team(2),
      role:        TeamRole::Editor,
      owns_stream: false,
      share:       Some(ShareLevel::Edit),
    };
    assert_eq!(effective_level(false, &[a, b]), AccessLevel::Editor);
    assert_eq!(effective_level(false, &[b, a]), AccessLevel::Editor);
  }

  #[test]
  fn direct_owner_is_absolute() {
    let capped = grant(TeamRole::Viewer, false, Some(ShareLevel::View));
    assert_eq!(effective_level(true, &[capped]), AccessLevel::Owner);
    assert_eq!(effective_level(true, &[]), AccessLevel::Owner);
    assert_eq!(effective_level(false, &[]), AccessLevel::None);
  }
}

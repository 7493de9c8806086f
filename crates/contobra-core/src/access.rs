//! The role authorization table.
//!
//! A pure, static mapping from role to the ordered list of screens that
//! role may mount, and from screen to the actions it permits. There is no
//! state here; enforcement happens wherever a caller consults the table
//! (the API layer does so on every request).

use serde::Serialize;

use crate::user::Role;

// ─── Screens ─────────────────────────────────────────────────────────────────

/// A top-level surface a role may mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
  // admin
  ManageProjects,
  ManageUsers,
  ViewStatistics,
  ViewAllEvidence,
  // supervisor
  ManageOwnProjects,
  ManageAssignments,
  ReviewEvidence,
  ViewLiveMap,
  // operator
  ViewAssignedProjects,
  SubmitEvidence,
  BroadcastLocation,
}

/// A concrete operation a screen permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
  CreateProject,
  /// Any field, including reassigning the supervisor and the status.
  UpdateAnyProject,
  CreateUser,
  UpdateRole,
  ViewStatistics,
  /// Read-only, download only.
  ViewAnyEvidence,
  /// Name, radius, and status only, scoped to `supervisor_id == self`.
  UpdateOwnProjectDetails,
  /// Full-replace assignment writes, scoped to own projects.
  AssignOperators,
  /// Approve or reject, scoped to evidence on own projects.
  ReviewEvidence,
  ViewLivePositions,
  ViewAssignedProjects,
  /// Create only, scoped to assigned projects.
  SubmitEvidence,
  /// Overwrite own live position only.
  BroadcastOwnPosition,
}

impl Screen {
  /// The actions this screen exposes.
  pub fn actions(self) -> &'static [Action] {
    match self {
      Self::ManageProjects => &[Action::CreateProject, Action::UpdateAnyProject],
      Self::ManageUsers => &[Action::CreateUser, Action::UpdateRole],
      Self::ViewStatistics => &[Action::ViewStatistics],
      Self::ViewAllEvidence => &[Action::ViewAnyEvidence],
      Self::ManageOwnProjects => &[Action::UpdateOwnProjectDetails],
      Self::ManageAssignments => &[Action::AssignOperators],
      Self::ReviewEvidence => &[Action::ReviewEvidence],
      Self::ViewLiveMap => &[Action::ViewLivePositions],
      Self::ViewAssignedProjects => &[Action::ViewAssignedProjects],
      Self::SubmitEvidence => &[Action::SubmitEvidence],
      Self::BroadcastLocation => &[Action::BroadcastOwnPosition],
    }
  }
}

// ─── The table ───────────────────────────────────────────────────────────────

/// Ordered screens for a role. A missing or unknown role maps to the empty
/// slice: nothing mounts, only the identity-display fallback renders.
pub fn screens_for(role: Option<Role>) -> &'static [Screen] {
  match role {
    Some(Role::Admin) => &[
      Screen::ManageProjects,
      Screen::ManageUsers,
      Screen::ViewStatistics,
      Screen::ViewAllEvidence,
    ],
    Some(Role::Supervisor) => &[
      Screen::ManageOwnProjects,
      Screen::ManageAssignments,
      Screen::ReviewEvidence,
      Screen::ViewLiveMap,
    ],
    Some(Role::Operator) => &[
      Screen::ViewAssignedProjects,
      Screen::SubmitEvidence,
      Screen::BroadcastLocation,
    ],
    None => &[],
  }
}

/// Whether `role` reaches `action` through any of its screens.
pub fn permits(role: Option<Role>, action: Action) -> bool {
  screens_for(role)
    .iter()
    .any(|screen| screen.actions().contains(&action))
}

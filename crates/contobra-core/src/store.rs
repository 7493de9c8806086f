//! The `FieldStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `contobra-store-sqlite`). Higher layers (`contobra-api`, the session
//! model) depend on this abstraction, not on any concrete backend.
//!
//! Scoping rules that the original system left to the UI are enforced here,
//! at the store boundary: a supervisor cannot review evidence on, assign
//! operators to, or edit a project they do not supervise, no matter what
//! the caller sends.

use std::{collections::BTreeSet, future::Future};

use uuid::Uuid;

use crate::{
  evidence::{Evidence, NewEvidence, Verdict},
  feed::Subscription,
  position::LivePosition,
  project::{NewProject, Project, ProjectDetails, ProjectUpdate},
  user::{Credentials, NewUser, Role, UserAccount},
};

// ─── Query scope ─────────────────────────────────────────────────────────────

/// Which slice of the projects collection a reader may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectScope {
  /// Every project (admin).
  All,
  /// Projects supervised by this user.
  SupervisedBy(Uuid),
  /// Projects in this operator's assignment set. Resolved through the
  /// operator's own `assigned_projects`, so nothing outside that set can
  /// ever be returned.
  AssignedTo(Uuid),
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a ContObra storage backend.
///
/// Writes are single-record and atomic; there are no multi-record
/// transactions. Every committed write publishes its collection on the
/// backend's change bus so live subscriptions can refresh.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait FieldStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Create and persist a new account. `uid` and `created_at` are assigned
  /// by the store; the assignment set starts empty.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<UserAccount, Self::Error>> + Send + '_;

  /// Retrieve an account by uid. Returns `None` if not found.
  fn get_user(
    &self,
    uid: Uuid,
  ) -> impl Future<Output = Result<Option<UserAccount>, Self::Error>> + Send + '_;

  fn get_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<UserAccount>, Self::Error>> + Send + 'a;

  /// The credential material for an email, for the verifier only.
  fn credentials_for<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + 'a;

  /// List accounts, optionally restricted to one role.
  fn list_users(
    &self,
    role: Option<Role>,
  ) -> impl Future<Output = Result<Vec<UserAccount>, Self::Error>> + Send + '_;

  /// Change an account's role.
  fn set_role(
    &self,
    uid: Uuid,
    role: Role,
  ) -> impl Future<Output = Result<UserAccount, Self::Error>> + Send + '_;

  /// Replace `operator_id`'s assignment set with exactly `projects` — a
  /// total overwrite, not a merge.
  ///
  /// Fails unless the target is an operator and every listed project is
  /// supervised by `acting_supervisor`.
  fn assign_projects(
    &self,
    acting_supervisor: Uuid,
    operator_id: Uuid,
    projects: BTreeSet<Uuid>,
  ) -> impl Future<Output = Result<UserAccount, Self::Error>> + Send + '_;

  // ── Projects ──────────────────────────────────────────────────────────

  fn create_project(
    &self,
    input: NewProject,
  ) -> impl Future<Output = Result<Project, Self::Error>> + Send + '_;

  fn get_project(
    &self,
    project_id: Uuid,
  ) -> impl Future<Output = Result<Option<Project>, Self::Error>> + Send + '_;

  fn list_projects(
    &self,
    scope: ProjectScope,
  ) -> impl Future<Output = Result<Vec<Project>, Self::Error>> + Send + '_;

  /// Full update, any field. Admin surface.
  fn update_project(
    &self,
    project_id: Uuid,
    update: ProjectUpdate,
  ) -> impl Future<Output = Result<Project, Self::Error>> + Send + '_;

  /// Limited update (name / radius / status), legal only for the project's
  /// own supervisor.
  fn update_project_details(
    &self,
    acting_supervisor: Uuid,
    project_id: Uuid,
    details: ProjectDetails,
  ) -> impl Future<Output = Result<Project, Self::Error>> + Send + '_;

  // ── Evidence ──────────────────────────────────────────────────────────

  /// Record a new submission in `pendiente`. Fails unless the submitting
  /// operator is assigned to the target project.
  fn submit_evidence(
    &self,
    input: NewEvidence,
  ) -> impl Future<Output = Result<Evidence, Self::Error>> + Send + '_;

  fn get_evidence(
    &self,
    evidence_id: Uuid,
  ) -> impl Future<Output = Result<Option<Evidence>, Self::Error>> + Send + '_;

  /// All evidence for a project, newest submission first.
  fn list_evidence(
    &self,
    project_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Evidence>, Self::Error>> + Send + '_;

  /// Apply a review verdict; legal only from `pendiente`, and only for the
  /// supervisor of the owning project. The status, reviewer, and review
  /// timestamp land in one atomic write.
  fn review_evidence(
    &self,
    reviewer_id: Uuid,
    evidence_id: Uuid,
    verdict: Verdict,
  ) -> impl Future<Output = Result<Evidence, Self::Error>> + Send + '_;

  // ── Live positions ────────────────────────────────────────────────────

  /// Overwrite the operator's current position. No history is kept.
  fn upsert_position(
    &self,
    position: LivePosition,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_position(
    &self,
    operator_id: Uuid,
  ) -> impl Future<Output = Result<Option<LivePosition>, Self::Error>> + Send + '_;

  fn list_positions(
    &self,
  ) -> impl Future<Output = Result<Vec<LivePosition>, Self::Error>> + Send + '_;

  // ── Live feeds ────────────────────────────────────────────────────────

  /// Live feed over [`Self::list_projects`]. An `AssignedTo` scope also
  /// refreshes on user changes, because the assignment set lives on the
  /// user record.
  fn watch_projects(
    &self,
    scope: ProjectScope,
  ) -> impl Future<Output = Result<Subscription<Project>, Self::Error>> + Send + '_;

  /// Live feed over [`Self::list_evidence`] for one project.
  fn watch_evidence(
    &self,
    project_id: Uuid,
  ) -> impl Future<Output = Result<Subscription<Evidence>, Self::Error>> + Send + '_;

  /// Live feed over every operator's current position.
  fn watch_positions(
    &self,
  ) -> impl Future<Output = Result<Subscription<LivePosition>, Self::Error>> + Send + '_;
}

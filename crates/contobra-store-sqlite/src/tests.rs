//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::BTreeSet;

use chrono::{TimeZone, Utc};
use contobra_core::{
  evidence::{MediaKind, NewEvidence, ReviewStatus, Verdict},
  position::LivePosition,
  project::{GeoPoint, NewProject, ProjectDetails, ProjectStatus, ProjectUpdate},
  store::{FieldStore, ProjectScope},
  user::{NewUser, Role, UserAccount},
  Error as CoreError,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_user(name: &str, email: &str, role: Option<Role>) -> NewUser {
  NewUser {
    name:          name.into(),
    email:         email.into(),
    password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
    role,
  }
}

async fn supervisor(s: &SqliteStore, email: &str) -> UserAccount {
  s.create_user(new_user("Laura", email, Some(Role::Supervisor)))
    .await
    .unwrap()
}

async fn operator(s: &SqliteStore, email: &str) -> UserAccount {
  s.create_user(new_user("Miguel", email, Some(Role::Operator)))
    .await
    .unwrap()
}

fn project_input(supervisor_id: Uuid, name: &str) -> NewProject {
  NewProject {
    name: name.into(),
    center: GeoPoint { lat: 19.43, lon: -99.13 },
    radius_m: 75.0,
    supervisor_id,
    start_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    estimated_end: Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap(),
  }
}

fn evidence_input(project_id: Uuid, operator_id: Uuid) -> NewEvidence {
  NewEvidence {
    project_id,
    operator_id,
    kind: MediaKind::Photo,
    media_url: "https://media.example/e1.jpg".into(),
    capture_location: GeoPoint { lat: 19.43, lon: -99.13 },
    description: "colado de losa".into(),
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_user() {
  let s = store().await;

  let created = s
    .create_user(new_user("Ana", "ana@contobra.example", Some(Role::Admin)))
    .await
    .unwrap();
  assert_eq!(created.role, Some(Role::Admin));
  assert!(created.assigned_projects.is_empty());

  let fetched = s.get_user(created.uid).await.unwrap().unwrap();
  assert_eq!(fetched.uid, created.uid);
  assert_eq!(fetched.email, "ana@contobra.example");
  assert_eq!(fetched.role, Some(Role::Admin));
}

#[tokio::test]
async fn get_user_missing_returns_none() {
  let s = store().await;
  assert!(s.get_user(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn lookup_by_email_and_credentials() {
  let s = store().await;
  let created = operator(&s, "miguel@contobra.example").await;

  let by_email = s
    .get_user_by_email("miguel@contobra.example")
    .await
    .unwrap()
    .unwrap();
  assert_eq!(by_email.uid, created.uid);

  let creds = s
    .credentials_for("miguel@contobra.example")
    .await
    .unwrap()
    .unwrap();
  assert_eq!(creds.uid, created.uid);
  assert!(creds.password_hash.starts_with("$argon2id$"));

  assert!(s.credentials_for("nobody@contobra.example").await.unwrap().is_none());
}

#[tokio::test]
async fn list_users_filtered_by_role() {
  let s = store().await;
  supervisor(&s, "laura@contobra.example").await;
  operator(&s, "m1@contobra.example").await;
  operator(&s, "m2@contobra.example").await;

  let all = s.list_users(None).await.unwrap();
  assert_eq!(all.len(), 3);

  let operators = s.list_users(Some(Role::Operator)).await.unwrap();
  assert_eq!(operators.len(), 2);
  assert!(operators.iter().all(|u| u.role == Some(Role::Operator)));
}

#[tokio::test]
async fn set_role_changes_role_only() {
  let s = store().await;
  let created = s
    .create_user(new_user("Nuevo", "nuevo@contobra.example", None))
    .await
    .unwrap();
  assert_eq!(created.role, None);

  let updated = s.set_role(created.uid, Role::Supervisor).await.unwrap();
  assert_eq!(updated.role, Some(Role::Supervisor));
  assert_eq!(updated.email, created.email);

  let fetched = s.get_user(created.uid).await.unwrap().unwrap();
  assert_eq!(fetched.role, Some(Role::Supervisor));
}

#[tokio::test]
async fn demoting_an_operator_clears_assignments() {
  let s = store().await;
  let sup = supervisor(&s, "laura@contobra.example").await;
  let op = operator(&s, "miguel@contobra.example").await;

  let p = s.create_project(project_input(sup.uid, "Obra A")).await.unwrap();
  s.assign_projects(sup.uid, op.uid, [p.project_id].into())
    .await
    .unwrap();

  let demoted = s.set_role(op.uid, Role::Supervisor).await.unwrap();
  assert_eq!(demoted.role, Some(Role::Supervisor));
  assert!(demoted.assigned_projects.is_empty());

  let fetched = s.get_user(op.uid).await.unwrap().unwrap();
  assert!(fetched.assigned_projects.is_empty());

  // Re-promotion starts from an empty set; old grants do not come back.
  let repromoted = s.set_role(op.uid, Role::Operator).await.unwrap();
  assert!(repromoted.assigned_projects.is_empty());
}

// ─── Assignments ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn assign_projects_replaces_the_whole_set() {
  let s = store().await;
  let sup = supervisor(&s, "laura@contobra.example").await;
  let op = operator(&s, "miguel@contobra.example").await;

  let a = s.create_project(project_input(sup.uid, "Obra A")).await.unwrap();
  let b = s.create_project(project_input(sup.uid, "Obra B")).await.unwrap();
  let c = s.create_project(project_input(sup.uid, "Obra C")).await.unwrap();

  let first: BTreeSet<_> = [a.project_id, b.project_id].into();
  s.assign_projects(sup.uid, op.uid, first).await.unwrap();

  // A full overwrite: A drops out, C comes in.
  let second: BTreeSet<_> = [b.project_id, c.project_id].into();
  let updated = s.assign_projects(sup.uid, op.uid, second.clone()).await.unwrap();
  assert_eq!(updated.assigned_projects, second);

  let fetched = s.get_user(op.uid).await.unwrap().unwrap();
  assert_eq!(fetched.assigned_projects, second);
}

#[tokio::test]
async fn assign_projects_rejects_non_operators() {
  let s = store().await;
  let sup = supervisor(&s, "laura@contobra.example").await;
  let other = supervisor(&s, "pedro@contobra.example").await;
  let p = s.create_project(project_input(sup.uid, "Obra A")).await.unwrap();

  let err = s
    .assign_projects(sup.uid, other.uid, [p.project_id].into())
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::Core(CoreError::NotAnOperator(_))));
}

#[tokio::test]
async fn assign_projects_rejects_foreign_projects() {
  let s = store().await;
  let sup = supervisor(&s, "laura@contobra.example").await;
  let other = supervisor(&s, "pedro@contobra.example").await;
  let op = operator(&s, "miguel@contobra.example").await;

  let theirs = s
    .create_project(project_input(other.uid, "Obra ajena"))
    .await
    .unwrap();

  let err = s
    .assign_projects(sup.uid, op.uid, [theirs.project_id].into())
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::Core(CoreError::ForeignProject(_))));

  // Nothing was written.
  let fetched = s.get_user(op.uid).await.unwrap().unwrap();
  assert!(fetched.assigned_projects.is_empty());
}

// ─── Projects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn new_projects_start_initiating() {
  let s = store().await;
  let sup = supervisor(&s, "laura@contobra.example").await;

  let p = s.create_project(project_input(sup.uid, "Obra A")).await.unwrap();
  assert_eq!(p.status, ProjectStatus::Initiating);

  let fetched = s.get_project(p.project_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, ProjectStatus::Initiating);
  assert_eq!(fetched.supervisor_id, sup.uid);
}

#[tokio::test]
async fn create_project_rejects_bad_input() {
  let s = store().await;
  let sup = supervisor(&s, "laura@contobra.example").await;

  let mut input = project_input(sup.uid, "Obra mala");
  input.radius_m = -5.0;
  let err = s.create_project(input).await.unwrap_err();
  assert!(matches!(err, crate::Error::Core(CoreError::InvalidRadius(_))));

  let mut input = project_input(sup.uid, "Obra mala");
  input.estimated_end = input.start_date - chrono::Duration::days(1);
  let err = s.create_project(input).await.unwrap_err();
  assert!(matches!(err, crate::Error::Core(CoreError::InvalidDates)));
}

#[tokio::test]
async fn list_projects_scoping() {
  let s = store().await;
  let laura = supervisor(&s, "laura@contobra.example").await;
  let pedro = supervisor(&s, "pedro@contobra.example").await;
  let op = operator(&s, "miguel@contobra.example").await;

  let a = s.create_project(project_input(laura.uid, "Obra A")).await.unwrap();
  let b = s.create_project(project_input(laura.uid, "Obra B")).await.unwrap();
  let c = s.create_project(project_input(pedro.uid, "Obra C")).await.unwrap();

  let all = s.list_projects(ProjectScope::All).await.unwrap();
  assert_eq!(all.len(), 3);

  let lauras = s
    .list_projects(ProjectScope::SupervisedBy(laura.uid))
    .await
    .unwrap();
  assert_eq!(lauras.len(), 2);
  assert!(lauras.iter().all(|p| p.supervisor_id == laura.uid));

  // Unassigned operator sees nothing.
  let mine = s
    .list_projects(ProjectScope::AssignedTo(op.uid))
    .await
    .unwrap();
  assert!(mine.is_empty());

  s.assign_projects(laura.uid, op.uid, [a.project_id].into())
    .await
    .unwrap();
  let mine = s
    .list_projects(ProjectScope::AssignedTo(op.uid))
    .await
    .unwrap();
  assert_eq!(mine.len(), 1);
  assert_eq!(mine[0].project_id, a.project_id);
  assert_ne!(mine[0].project_id, b.project_id);
  assert_ne!(mine[0].project_id, c.project_id);
}

#[tokio::test]
async fn update_project_overwrites_every_field() {
  let s = store().await;
  let laura = supervisor(&s, "laura@contobra.example").await;
  let pedro = supervisor(&s, "pedro@contobra.example").await;
  let p = s.create_project(project_input(laura.uid, "Obra A")).await.unwrap();

  let updated = s
    .update_project(p.project_id, ProjectUpdate {
      name:          "Obra A bis".into(),
      center:        GeoPoint { lat: 20.0, lon: -100.0 },
      radius_m:      120.0,
      supervisor_id: pedro.uid,
      status:        ProjectStatus::InProgress,
      start_date:    p.start_date,
      estimated_end: p.estimated_end,
    })
    .await
    .unwrap();

  assert_eq!(updated.name, "Obra A bis");
  assert_eq!(updated.supervisor_id, pedro.uid);
  assert_eq!(updated.status, ProjectStatus::InProgress);
  assert_eq!(updated.created_at, p.created_at);

  let fetched = s.get_project(p.project_id).await.unwrap().unwrap();
  assert_eq!(fetched.supervisor_id, pedro.uid);
  assert_eq!(fetched.radius_m, 120.0);
}

#[tokio::test]
async fn update_project_details_is_supervisor_scoped() {
  let s = store().await;
  let laura = supervisor(&s, "laura@contobra.example").await;
  let pedro = supervisor(&s, "pedro@contobra.example").await;
  let p = s.create_project(project_input(laura.uid, "Obra A")).await.unwrap();

  let details = ProjectDetails {
    name:     "Obra A (fase 2)".into(),
    radius_m: 90.0,
    status:   ProjectStatus::InProgress,
  };

  // Pedro does not supervise this project.
  let err = s
    .update_project_details(pedro.uid, p.project_id, details.clone())
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::Core(CoreError::ForeignProject(_))));

  let updated = s
    .update_project_details(laura.uid, p.project_id, details)
    .await
    .unwrap();
  assert_eq!(updated.name, "Obra A (fase 2)");
  assert_eq!(updated.status, ProjectStatus::InProgress);
  // Untouched fields survive.
  assert_eq!(updated.supervisor_id, laura.uid);
  assert_eq!(updated.center, p.center);
}

// ─── Evidence ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn submit_evidence_requires_assignment() {
  let s = store().await;
  let sup = supervisor(&s, "laura@contobra.example").await;
  let op = operator(&s, "miguel@contobra.example").await;
  let p = s.create_project(project_input(sup.uid, "Obra A")).await.unwrap();

  let err = s
    .submit_evidence(evidence_input(p.project_id, op.uid))
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::Core(CoreError::NotAssigned(_, _))));

  s.assign_projects(sup.uid, op.uid, [p.project_id].into())
    .await
    .unwrap();

  let ev = s
    .submit_evidence(evidence_input(p.project_id, op.uid))
    .await
    .unwrap();
  assert_eq!(ev.status, ReviewStatus::Pending);
  assert!(ev.reviewed_by.is_none());
}

#[tokio::test]
async fn list_evidence_is_newest_first() {
  let s = store().await;
  let sup = supervisor(&s, "laura@contobra.example").await;
  let op = operator(&s, "miguel@contobra.example").await;
  let p = s.create_project(project_input(sup.uid, "Obra A")).await.unwrap();
  s.assign_projects(sup.uid, op.uid, [p.project_id].into())
    .await
    .unwrap();

  let first = s
    .submit_evidence(evidence_input(p.project_id, op.uid))
    .await
    .unwrap();
  tokio::time::sleep(std::time::Duration::from_millis(5)).await;
  let second = s
    .submit_evidence(evidence_input(p.project_id, op.uid))
    .await
    .unwrap();

  let listed = s.list_evidence(p.project_id).await.unwrap();
  assert_eq!(listed.len(), 2);
  assert_eq!(listed[0].evidence_id, second.evidence_id);
  assert_eq!(listed[1].evidence_id, first.evidence_id);
}

#[tokio::test]
async fn review_evidence_happy_path_and_already_reviewed() {
  let s = store().await;
  let sup = supervisor(&s, "laura@contobra.example").await;
  let op = operator(&s, "miguel@contobra.example").await;
  let p = s.create_project(project_input(sup.uid, "Obra A")).await.unwrap();
  s.assign_projects(sup.uid, op.uid, [p.project_id].into())
    .await
    .unwrap();
  let ev = s
    .submit_evidence(evidence_input(p.project_id, op.uid))
    .await
    .unwrap();

  let reviewed = s
    .review_evidence(sup.uid, ev.evidence_id, Verdict::Approved)
    .await
    .unwrap();
  assert_eq!(reviewed.status, ReviewStatus::Approved);
  assert_eq!(reviewed.reviewed_by, Some(sup.uid));
  assert!(reviewed.reviewed_at.is_some());

  // A second verdict, either way, must not overwrite the first.
  let err = s
    .review_evidence(sup.uid, ev.evidence_id, Verdict::Rejected)
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::Core(CoreError::AlreadyReviewed(_))));

  let fetched = s.get_evidence(ev.evidence_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, ReviewStatus::Approved);
}

#[tokio::test]
async fn review_evidence_rejects_foreign_supervisor() {
  let s = store().await;
  let laura = supervisor(&s, "laura@contobra.example").await;
  let pedro = supervisor(&s, "pedro@contobra.example").await;
  let op = operator(&s, "miguel@contobra.example").await;
  let p = s.create_project(project_input(laura.uid, "Obra A")).await.unwrap();
  s.assign_projects(laura.uid, op.uid, [p.project_id].into())
    .await
    .unwrap();
  let ev = s
    .submit_evidence(evidence_input(p.project_id, op.uid))
    .await
    .unwrap();

  let err = s
    .review_evidence(pedro.uid, ev.evidence_id, Verdict::Approved)
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::Core(CoreError::ForeignProject(_))));

  let fetched = s.get_evidence(ev.evidence_id).await.unwrap().unwrap();
  assert!(fetched.status.is_pending());
}

// ─── Live positions ──────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_position_overwrites_in_place() {
  let s = store().await;
  let op = operator(&s, "miguel@contobra.example").await;

  s.upsert_position(LivePosition {
    operator_id:    op.uid,
    position:       GeoPoint { lat: 19.0, lon: -99.0 },
    updated_at:     Utc::now(),
    active_project: None,
  })
  .await
  .unwrap();

  let project_id = Uuid::new_v4();
  s.upsert_position(LivePosition {
    operator_id:    op.uid,
    position:       GeoPoint { lat: 19.5, lon: -99.5 },
    updated_at:     Utc::now(),
    active_project: Some(project_id),
  })
  .await
  .unwrap();

  let positions = s.list_positions().await.unwrap();
  assert_eq!(positions.len(), 1);
  assert_eq!(positions[0].position.lat, 19.5);
  assert_eq!(positions[0].active_project, Some(project_id));

  let one = s.get_position(op.uid).await.unwrap().unwrap();
  assert_eq!(one.position.lon, -99.5);
}

#[tokio::test]
async fn broadcast_loop_persists_each_fix() {
  use tokio::sync::{mpsc, watch};

  let s = store().await;
  let sup = supervisor(&s, "laura@contobra.example").await;
  let op = operator(&s, "miguel@contobra.example").await;
  let p = s.create_project(project_input(sup.uid, "Obra A")).await.unwrap();

  let (fix_tx, fix_rx) = mpsc::channel(8);
  let (active_tx, active_rx) = watch::channel(Some(p.project_id));
  let task = tokio::spawn(contobra_core::position::broadcast_positions(
    s.clone(),
    op.uid,
    fix_rx,
    active_rx,
  ));

  fix_tx.send(GeoPoint { lat: 19.1, lon: -99.1 }).await.unwrap();
  fix_tx.send(GeoPoint { lat: 19.2, lon: -99.2 }).await.unwrap();
  drop(fix_tx);
  task.await.unwrap();

  // Only the last fix survives, stamped with the active project.
  let pos = s.get_position(op.uid).await.unwrap().unwrap();
  assert_eq!(pos.position.lat, 19.2);
  assert_eq!(pos.active_project, Some(p.project_id));
  drop(active_tx);
}

// ─── Live feeds ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn watch_projects_delivers_fresh_snapshots() {
  let s = store().await;
  let sup = supervisor(&s, "laura@contobra.example").await;

  let mut sub = s.watch_projects(ProjectScope::All).await.unwrap();
  assert!(sub.snapshot().is_empty());

  let p = s.create_project(project_input(sup.uid, "Obra A")).await.unwrap();

  let snapshot = sub.next().await.unwrap();
  assert_eq!(snapshot.len(), 1);
  assert_eq!(snapshot[0].project_id, p.project_id);
}

#[tokio::test]
async fn assigned_feed_refreshes_when_assignments_change() {
  let s = store().await;
  let sup = supervisor(&s, "laura@contobra.example").await;
  let op = operator(&s, "miguel@contobra.example").await;
  let p = s.create_project(project_input(sup.uid, "Obra A")).await.unwrap();

  let mut sub = s
    .watch_projects(ProjectScope::AssignedTo(op.uid))
    .await
    .unwrap();
  assert!(sub.snapshot().is_empty());

  // The assignment write touches the users collection, not projects, and
  // the feed must still pick it up.
  s.assign_projects(sup.uid, op.uid, [p.project_id].into())
    .await
    .unwrap();

  let snapshot = sub.next().await.unwrap();
  assert_eq!(snapshot.len(), 1);
  assert_eq!(snapshot[0].project_id, p.project_id);
}

#[tokio::test]
async fn watch_positions_sees_every_operator() {
  let s = store().await;
  let op = operator(&s, "miguel@contobra.example").await;

  let mut sub = s.watch_positions().await.unwrap();

  s.upsert_position(LivePosition {
    operator_id:    op.uid,
    position:       GeoPoint { lat: 19.0, lon: -99.0 },
    updated_at:     Utc::now(),
    active_project: None,
  })
  .await
  .unwrap();

  let snapshot = sub.next().await.unwrap();
  assert_eq!(snapshot.len(), 1);
  assert_eq!(snapshot[0].operator_id, op.uid);
}

//! [`SqliteStore`] — the SQLite implementation of [`FieldStore`].

use std::{collections::BTreeSet, path::Path};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use contobra_core::{
  evidence::{Evidence, NewEvidence, ReviewStatus, Verdict},
  feed::{self, ChangeBus, Collection, Subscription},
  position::LivePosition,
  project::{
    NewProject, Project, ProjectDetails, ProjectStatus, ProjectUpdate,
  },
  store::{FieldStore, ProjectScope},
  user::{Credentials, NewUser, Role, UserAccount},
};

use crate::{
  encode::{
    encode_assigned, encode_dt, encode_media_kind, encode_project_status,
    encode_review_status, encode_role, encode_uuid, RawEvidence, RawPosition,
    RawProject, RawUser,
  },
  schema::SCHEMA,
  Error, Result,
};

use contobra_core::Error as CoreError;

// ─── Row mapping ─────────────────────────────────────────────────────────────

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    uid:               row.get(0)?,
    name:              row.get(1)?,
    email:             row.get(2)?,
    role:              row.get(3)?,
    assigned_projects: row.get(4)?,
    created_at:        row.get(5)?,
  })
}

fn project_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawProject> {
  Ok(RawProject {
    project_id:    row.get(0)?,
    name:          row.get(1)?,
    lat:           row.get(2)?,
    lon:           row.get(3)?,
    radius_m:      row.get(4)?,
    supervisor_id: row.get(5)?,
    status:        row.get(6)?,
    start_date:    row.get(7)?,
    estimated_end: row.get(8)?,
    created_at:    row.get(9)?,
  })
}

fn evidence_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEvidence> {
  Ok(RawEvidence {
    evidence_id:  row.get(0)?,
    project_id:   row.get(1)?,
    operator_id:  row.get(2)?,
    kind:         row.get(3)?,
    media_url:    row.get(4)?,
    lat:          row.get(5)?,
    lon:          row.get(6)?,
    description:  row.get(7)?,
    submitted_at: row.get(8)?,
    status:       row.get(9)?,
    reviewed_by:  row.get(10)?,
    reviewed_at:  row.get(11)?,
  })
}

fn position_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawPosition> {
  Ok(RawPosition {
    operator_id:    row.get(0)?,
    lat:            row.get(1)?,
    lon:            row.get(2)?,
    updated_at:     row.get(3)?,
    active_project: row.get(4)?,
  })
}

const USER_COLS: &str = "uid, name, email, role, assigned_projects, created_at";
const PROJECT_COLS: &str = "project_id, name, lat, lon, radius_m, \
   supervisor_id, status, start_date, estimated_end, created_at";
const EVIDENCE_COLS: &str = "evidence_id, project_id, operator_id, kind, \
   media_url, lat, lon, description, submitted_at, status, reviewed_by, \
   reviewed_at";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A ContObra field store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted and all
/// clones share one change bus, so a write through any clone is visible to
/// every live feed.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
  bus:  ChangeBus,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, bus: ChangeBus::new() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, bus: ChangeBus::new() };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn fetch_user(&self, uid: Uuid) -> Result<UserAccount> {
    self
      .get_user(uid)
      .await?
      .ok_or_else(|| CoreError::UserNotFound(uid).into())
  }

  async fn fetch_project(&self, project_id: Uuid) -> Result<Project> {
    self
      .get_project(project_id)
      .await?
      .ok_or_else(|| CoreError::ProjectNotFound(project_id).into())
  }
}

// ─── FieldStore impl ─────────────────────────────────────────────────────────

impl FieldStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<UserAccount> {
    let account = UserAccount {
      uid:               Uuid::new_v4(),
      name:              input.name,
      email:             input.email,
      role:              input.role,
      assigned_projects: BTreeSet::new(),
      created_at:        Utc::now(),
    };

    let uid_str      = encode_uuid(account.uid);
    let name         = account.name.clone();
    let email        = account.email.clone();
    let hash         = input.password_hash;
    let role_str     = encode_role(account.role);
    let assigned_str = encode_assigned(&account.assigned_projects)?;
    let at_str       = encode_dt(account.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (
             uid, name, email, password_hash, role, assigned_projects, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            uid_str,
            name,
            email,
            hash,
            role_str,
            assigned_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    self.bus.publish(Collection::Users);
    Ok(account)
  }

  async fn get_user(&self, uid: Uuid) -> Result<Option<UserAccount>> {
    let uid_str = encode_uuid(uid);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLS} FROM users WHERE uid = ?1"),
            rusqlite::params![uid_str],
            user_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_account).transpose()
  }

  async fn get_user_by_email(&self, email: &str) -> Result<Option<UserAccount>> {
    let email = email.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLS} FROM users WHERE email = ?1"),
            rusqlite::params![email],
            user_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_account).transpose()
  }

  async fn credentials_for(&self, email: &str) -> Result<Option<Credentials>> {
    let email = email.to_owned();

    let raw: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT uid, password_hash FROM users WHERE email = ?1",
            rusqlite::params![email],
            |row| Ok((row.get(0)?, row.get(1)?)),
          )
          .optional()?)
      })
      .await?;

    raw
      .map(|(uid_str, password_hash)| {
        Ok(Credentials {
          uid: crate::encode::decode_uuid(&uid_str)?,
          password_hash,
        })
      })
      .transpose()
  }

  async fn list_users(&self, role: Option<Role>) -> Result<Vec<UserAccount>> {
    let role_str = role.map(Role::as_str).map(str::to_owned);

    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(r) = role_str {
          let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLS} FROM users WHERE role = ?1 ORDER BY created_at"
          ))?;
          stmt
            .query_map(rusqlite::params![r], user_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLS} FROM users ORDER BY created_at"
          ))?;
          stmt
            .query_map([], user_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_account).collect()
  }

  async fn set_role(&self, uid: Uuid, role: Role) -> Result<UserAccount> {
    let account = self.fetch_user(uid).await?;

    // Assignments live on operator accounts only; any other role clears
    // them, and a later re-promotion starts from an empty set.
    let assigned = if role == Role::Operator {
      account.assigned_projects.clone()
    } else {
      BTreeSet::new()
    };

    let uid_str      = encode_uuid(uid);
    let role_str     = role.as_str();
    let assigned_str = encode_assigned(&assigned)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE users SET role = ?1, assigned_projects = ?2 WHERE uid = ?3",
          rusqlite::params![role_str, assigned_str, uid_str],
        )?;
        Ok(())
      })
      .await?;

    self.bus.publish(Collection::Users);
    Ok(UserAccount {
      role: Some(role),
      assigned_projects: assigned,
      ..account
    })
  }

  async fn assign_projects(
    &self,
    acting_supervisor: Uuid,
    operator_id: Uuid,
    projects: BTreeSet<Uuid>,
  ) -> Result<UserAccount> {
    let account = self.fetch_user(operator_id).await?;
    if !account.is_operator() {
      return Err(CoreError::NotAnOperator(operator_id).into());
    }

    // Every project in the new set must belong to the acting supervisor;
    // the write is all-or-nothing.
    for project_id in &projects {
      let project = self.fetch_project(*project_id).await?;
      if project.supervisor_id != acting_supervisor {
        return Err(CoreError::ForeignProject(*project_id).into());
      }
    }

    let assigned_str = encode_assigned(&projects)?;
    let uid_str      = encode_uuid(operator_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE users SET assigned_projects = ?1 WHERE uid = ?2",
          rusqlite::params![assigned_str, uid_str],
        )?;
        Ok(())
      })
      .await?;

    self.bus.publish(Collection::Users);
    Ok(UserAccount { assigned_projects: projects, ..account })
  }

  // ── Projects ──────────────────────────────────────────────────────────────

  async fn create_project(&self, input: NewProject) -> Result<Project> {
    input.validate()?;

    let project = Project {
      project_id:    Uuid::new_v4(),
      name:          input.name,
      center:        input.center,
      radius_m:      input.radius_m,
      supervisor_id: input.supervisor_id,
      status:        ProjectStatus::Initiating,
      start_date:    input.start_date,
      estimated_end: input.estimated_end,
      created_at:    Utc::now(),
    };

    let id_str     = encode_uuid(project.project_id);
    let name       = project.name.clone();
    let lat        = project.center.lat;
    let lon        = project.center.lon;
    let radius_m   = project.radius_m;
    let sup_str    = encode_uuid(project.supervisor_id);
    let status_str = encode_project_status(project.status);
    let start_str  = encode_dt(project.start_date);
    let end_str    = encode_dt(project.estimated_end);
    let at_str     = encode_dt(project.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO projects (
             project_id, name, lat, lon, radius_m,
             supervisor_id, status, start_date, estimated_end, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str, name, lat, lon, radius_m, sup_str, status_str, start_str,
            end_str, at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    self.bus.publish(Collection::Projects);
    Ok(project)
  }

  async fn get_project(&self, project_id: Uuid) -> Result<Option<Project>> {
    let id_str = encode_uuid(project_id);

    let raw: Option<RawProject> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {PROJECT_COLS} FROM projects WHERE project_id = ?1"),
            rusqlite::params![id_str],
            project_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawProject::into_project).transpose()
  }

  async fn list_projects(&self, scope: ProjectScope) -> Result<Vec<Project>> {
    let raws: Vec<RawProject> = match scope {
      ProjectScope::All => {
        self
          .conn
          .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
              "SELECT {PROJECT_COLS} FROM projects ORDER BY created_at DESC"
            ))?;
            let rows = stmt
              .query_map([], project_from_row)?
              .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
          })
          .await?
      }

      ProjectScope::SupervisedBy(uid) => {
        let sup_str = encode_uuid(uid);
        self
          .conn
          .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
              "SELECT {PROJECT_COLS} FROM projects
               WHERE supervisor_id = ?1 ORDER BY created_at DESC"
            ))?;
            let rows = stmt
              .query_map(rusqlite::params![sup_str], project_from_row)?
              .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
          })
          .await?
      }

      // Resolved through the operator's own assignment set, so nothing
      // outside it can ever be returned.
      ProjectScope::AssignedTo(uid) => {
        let assigned = self.fetch_user(uid).await?.assigned_projects;
        if assigned.is_empty() {
          return Ok(vec![]);
        }
        let ids: Vec<String> =
          assigned.into_iter().map(encode_uuid).collect();

        self
          .conn
          .call(move |conn| {
            let placeholders = vec!["?"; ids.len()].join(", ");
            let sql = format!(
              "SELECT {PROJECT_COLS} FROM projects
               WHERE project_id IN ({placeholders}) ORDER BY created_at DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
              .query_map(rusqlite::params_from_iter(ids.iter()), project_from_row)?
              .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
          })
          .await?
      }
    };

    raws.into_iter().map(RawProject::into_project).collect()
  }

  async fn update_project(
    &self,
    project_id: Uuid,
    update: ProjectUpdate,
  ) -> Result<Project> {
    update.validate()?;
    let existing = self.fetch_project(project_id).await?;

    let updated = Project {
      project_id,
      name:          update.name,
      center:        update.center,
      radius_m:      update.radius_m,
      supervisor_id: update.supervisor_id,
      status:        update.status,
      start_date:    update.start_date,
      estimated_end: update.estimated_end,
      created_at:    existing.created_at,
    };

    let id_str     = encode_uuid(project_id);
    let name       = updated.name.clone();
    let lat        = updated.center.lat;
    let lon        = updated.center.lon;
    let radius_m   = updated.radius_m;
    let sup_str    = encode_uuid(updated.supervisor_id);
    let status_str = encode_project_status(updated.status);
    let start_str  = encode_dt(updated.start_date);
    let end_str    = encode_dt(updated.estimated_end);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE projects SET
             name = ?1, lat = ?2, lon = ?3, radius_m = ?4,
             supervisor_id = ?5, status = ?6, start_date = ?7,
             estimated_end = ?8
           WHERE project_id = ?9",
          rusqlite::params![
            name, lat, lon, radius_m, sup_str, status_str, start_str, end_str,
            id_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    self.bus.publish(Collection::Projects);
    Ok(updated)
  }

  async fn update_project_details(
    &self,
    acting_supervisor: Uuid,
    project_id: Uuid,
    details: ProjectDetails,
  ) -> Result<Project> {
    details.validate()?;

    let existing = self.fetch_project(project_id).await?;
    if existing.supervisor_id != acting_supervisor {
      return Err(CoreError::ForeignProject(project_id).into());
    }

    let updated = Project {
      name: details.name,
      radius_m: details.radius_m,
      status: details.status,
      ..existing
    };

    let id_str     = encode_uuid(project_id);
    let name       = updated.name.clone();
    let radius_m   = updated.radius_m;
    let status_str = encode_project_status(updated.status);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE projects SET name = ?1, radius_m = ?2, status = ?3
           WHERE project_id = ?4",
          rusqlite::params![name, radius_m, status_str, id_str],
        )?;
        Ok(())
      })
      .await?;

    self.bus.publish(Collection::Projects);
    Ok(updated)
  }

  // ── Evidence ──────────────────────────────────────────────────────────────

  async fn submit_evidence(&self, input: NewEvidence) -> Result<Evidence> {
    let account = self.fetch_user(input.operator_id).await?;
    if !account.assigned_projects.contains(&input.project_id) {
      return Err(
        CoreError::NotAssigned(input.operator_id, input.project_id).into(),
      );
    }

    let evidence = Evidence {
      evidence_id:      Uuid::new_v4(),
      project_id:       input.project_id,
      operator_id:      input.operator_id,
      kind:             input.kind,
      media_url:        input.media_url,
      capture_location: input.capture_location,
      description:      input.description,
      submitted_at:     Utc::now(),
      status:           ReviewStatus::Pending,
      reviewed_by:      None,
      reviewed_at:      None,
    };

    let id_str      = encode_uuid(evidence.evidence_id);
    let project_str = encode_uuid(evidence.project_id);
    let op_str      = encode_uuid(evidence.operator_id);
    let kind_str    = encode_media_kind(evidence.kind);
    let media_url   = evidence.media_url.clone();
    let lat         = evidence.capture_location.lat;
    let lon         = evidence.capture_location.lon;
    let description = evidence.description.clone();
    let at_str      = encode_dt(evidence.submitted_at);
    let status_str  = encode_review_status(evidence.status);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO evidence (
             evidence_id, project_id, operator_id, kind, media_url,
             lat, lon, description, submitted_at, status
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str, project_str, op_str, kind_str, media_url, lat, lon,
            description, at_str, status_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    self.bus.publish(Collection::Evidence);
    Ok(evidence)
  }

  async fn get_evidence(&self, evidence_id: Uuid) -> Result<Option<Evidence>> {
    let id_str = encode_uuid(evidence_id);

    let raw: Option<RawEvidence> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {EVIDENCE_COLS} FROM evidence WHERE evidence_id = ?1"),
            rusqlite::params![id_str],
            evidence_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawEvidence::into_evidence).transpose()
  }

  async fn list_evidence(&self, project_id: Uuid) -> Result<Vec<Evidence>> {
    let project_str = encode_uuid(project_id);

    let raws: Vec<RawEvidence> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EVIDENCE_COLS} FROM evidence
           WHERE project_id = ?1 ORDER BY submitted_at DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![project_str], evidence_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvidence::into_evidence).collect()
  }

  async fn review_evidence(
    &self,
    reviewer_id: Uuid,
    evidence_id: Uuid,
    verdict: Verdict,
  ) -> Result<Evidence> {
    let mut evidence = self
      .get_evidence(evidence_id)
      .await?
      .ok_or(CoreError::EvidenceNotFound(evidence_id))?;

    let project = self.fetch_project(evidence.project_id).await?;
    if project.supervisor_id != reviewer_id {
      return Err(CoreError::ForeignProject(evidence.project_id).into());
    }

    // Domain-level transition check first; the SQL guard below covers the
    // race between two concurrent reviewers.
    evidence.review(verdict, reviewer_id, Utc::now())?;

    let id_str       = encode_uuid(evidence_id);
    let status_str   = encode_review_status(evidence.status);
    let reviewer_str = evidence.reviewed_by.map(encode_uuid);
    let at_str       = evidence.reviewed_at.map(encode_dt);

    let rows = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE evidence SET status = ?1, reviewed_by = ?2, reviewed_at = ?3
           WHERE evidence_id = ?4 AND status = 'pendiente'",
          rusqlite::params![status_str, reviewer_str, at_str, id_str],
        )?)
      })
      .await?;

    if rows == 0 {
      return Err(CoreError::AlreadyReviewed(evidence_id).into());
    }

    self.bus.publish(Collection::Evidence);
    Ok(evidence)
  }

  // ── Live positions ────────────────────────────────────────────────────────

  async fn upsert_position(&self, position: LivePosition) -> Result<()> {
    let op_str     = encode_uuid(position.operator_id);
    let lat        = position.position.lat;
    let lon        = position.position.lon;
    let at_str     = encode_dt(position.updated_at);
    let active_str = position.active_project.map(encode_uuid);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO live_positions (
             operator_id, lat, lon, updated_at, active_project
           ) VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT(operator_id) DO UPDATE SET
             lat = excluded.lat,
             lon = excluded.lon,
             updated_at = excluded.updated_at,
             active_project = excluded.active_project",
          rusqlite::params![op_str, lat, lon, at_str, active_str],
        )?;
        Ok(())
      })
      .await?;

    self.bus.publish(Collection::Positions);
    Ok(())
  }

  async fn get_position(&self, operator_id: Uuid) -> Result<Option<LivePosition>> {
    let op_str = encode_uuid(operator_id);

    let raw: Option<RawPosition> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT operator_id, lat, lon, updated_at, active_project
             FROM live_positions WHERE operator_id = ?1",
            rusqlite::params![op_str],
            position_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPosition::into_position).transpose()
  }

  async fn list_positions(&self) -> Result<Vec<LivePosition>> {
    let raws: Vec<RawPosition> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT operator_id, lat, lon, updated_at, active_project
           FROM live_positions ORDER BY updated_at DESC",
        )?;
        let rows = stmt
          .query_map([], position_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPosition::into_position).collect()
  }

  // ── Live feeds ────────────────────────────────────────────────────────────

  async fn watch_projects(
    &self,
    scope: ProjectScope,
  ) -> Result<Subscription<Project>> {
    let initial = self.list_projects(scope).await?;

    // An AssignedTo feed also refreshes on user changes, because the
    // assignment set lives on the user record.
    let collections = match scope {
      ProjectScope::AssignedTo(_) => {
        vec![Collection::Projects, Collection::Users]
      }
      _ => vec![Collection::Projects],
    };

    let store = self.clone();
    Ok(feed::subscribe(
      collections,
      self.bus.changes(),
      initial,
      move || {
        let store = store.clone();
        async move { store.list_projects(scope).await }
      },
    ))
  }

  async fn watch_evidence(
    &self,
    project_id: Uuid,
  ) -> Result<Subscription<Evidence>> {
    let initial = self.list_evidence(project_id).await?;

    let store = self.clone();
    Ok(feed::subscribe(
      vec![Collection::Evidence],
      self.bus.changes(),
      initial,
      move || {
        let store = store.clone();
        async move { store.list_evidence(project_id).await }
      },
    ))
  }

  async fn watch_positions(&self) -> Result<Subscription<LivePosition>> {
    let initial = self.list_positions().await?;

    let store = self.clone();
    Ok(feed::subscribe(
      vec![Collection::Positions],
      self.bus.changes(),
      initial,
      move || {
        let store = store.clone();
        async move { store.list_positions().await }
      },
    ))
  }
}

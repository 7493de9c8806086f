//! Handlers for `/projects` endpoints.
//!
//! | Method  | Path | Who |
//! |---------|------|-----|
//! | `GET`   | `/projects` | any role; the response is scoped to what the role may see |
//! | `POST`  | `/projects` | admin; returns 201, always `iniciando` |
//! | `PUT`   | `/projects/:id` | admin; full overwrite |
//! | `PATCH` | `/projects/:id` | supervisor; name / radius / status on own projects |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use contobra_core::{
  access::Action,
  project::{GeoPoint, NewProject, Project, ProjectDetails, ProjectStatus, ProjectUpdate},
  store::{FieldStore, ProjectScope},
  user::Role,
};

use crate::{AppState, auth::Principal, error::ApiError};

/// The project slice the principal's role may read.
pub fn scope_for(principal: &Principal) -> Result<ProjectScope, ApiError> {
  match principal.role() {
    Some(Role::Admin) => Ok(ProjectScope::All),
    Some(Role::Supervisor) => Ok(ProjectScope::SupervisedBy(principal.uid())),
    Some(Role::Operator) => Ok(ProjectScope::AssignedTo(principal.uid())),
    None => Err(ApiError::Forbidden("no role, no projects".into())),
  }
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /projects`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  principal: Principal,
) -> Result<Json<Vec<Project>>, ApiError>
where
  S: FieldStore + Clone + Send + Sync + 'static,
  ApiError: From<S::Error>,
{
  let scope = scope_for(&principal)?;
  Ok(Json(state.store.list_projects(scope).await?))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /projects`. Status is not accepted here;
/// every project starts in `iniciando`.
#[derive(Debug, Deserialize)]
pub struct NewProjectBody {
  pub name:          String,
  pub center:        GeoPoint,
  pub radius_m:      f64,
  pub supervisor_id: Uuid,
  pub start_date:    DateTime<Utc>,
  pub estimated_end: DateTime<Utc>,
}

impl From<NewProjectBody> for NewProject {
  fn from(b: NewProjectBody) -> Self {
    NewProject {
      name:          b.name,
      center:        b.center,
      radius_m:      b.radius_m,
      supervisor_id: b.supervisor_id,
      start_date:    b.start_date,
      estimated_end: b.estimated_end,
    }
  }
}

/// `POST /projects` — returns 201 + the stored project.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Json(body): Json<NewProjectBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FieldStore + Clone + Send + Sync + 'static,
  ApiError: From<S::Error>,
{
  principal.require(Action::CreateProject)?;
  let project = state.store.create_project(NewProject::from(body)).await?;
  Ok((StatusCode::CREATED, Json(project)))
}

// ─── Full update ─────────────────────────────────────────────────────────────

/// JSON body accepted by `PUT /projects/:id` — every mutable field,
/// including supervisor reassignment.
#[derive(Debug, Deserialize)]
pub struct ProjectUpdateBody {
  pub name:          String,
  pub center:        GeoPoint,
  pub radius_m:      f64,
  pub supervisor_id: Uuid,
  pub status:        ProjectStatus,
  pub start_date:    DateTime<Utc>,
  pub estimated_end: DateTime<Utc>,
}

impl From<ProjectUpdateBody> for ProjectUpdate {
  fn from(b: ProjectUpdateBody) -> Self {
    ProjectUpdate {
      name:          b.name,
      center:        b.center,
      radius_m:      b.radius_m,
      supervisor_id: b.supervisor_id,
      status:        b.status,
      start_date:    b.start_date,
      estimated_end: b.estimated_end,
    }
  }
}

/// `PUT /projects/:id`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Path(project_id): Path<Uuid>,
  Json(body): Json<ProjectUpdateBody>,
) -> Result<Json<Project>, ApiError>
where
  S: FieldStore + Clone + Send + Sync + 'static,
  ApiError: From<S::Error>,
{
  principal.require(Action::UpdateAnyProject)?;
  let project = state
    .store
    .update_project(project_id, ProjectUpdate::from(body))
    .await?;
  Ok(Json(project))
}

// ─── Detail update ───────────────────────────────────────────────────────────

/// JSON body accepted by `PATCH /projects/:id` — the supervisor subset.
#[derive(Debug, Deserialize)]
pub struct ProjectDetailsBody {
  pub name:     String,
  pub radius_m: f64,
  pub status:   ProjectStatus,
}

/// `PATCH /projects/:id` — scoped to the project's own supervisor.
pub async fn update_details<S>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Path(project_id): Path<Uuid>,
  Json(body): Json<ProjectDetailsBody>,
) -> Result<Json<Project>, ApiError>
where
  S: FieldStore + Clone + Send + Sync + 'static,
  ApiError: From<S::Error>,
{
  principal.require(Action::UpdateOwnProjectDetails)?;
  let project = state
    .store
    .update_project_details(principal.uid(), project_id, ProjectDetails {
      name:     body.name,
      radius_m: body.radius_m,
      status:   body.status,
    })
    .await?;
  Ok(Json(project))
}

//! Handlers for evidence endpoints.
//!
//! | Method | Path | Who |
//! |--------|------|-----|
//! | `GET`  | `/projects/:id/evidence` | admin anywhere; supervisor on own projects; operator on assigned |
//! | `POST` | `/evidence` | operator; submitter is always the principal |
//! | `POST` | `/evidence/:id/review` | supervisor of the owning project |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use contobra_core::{
  access::Action,
  evidence::{Evidence, MediaKind, NewEvidence, Verdict},
  project::GeoPoint,
  store::FieldStore,
  user::Role,
};

use crate::{AppState, auth::Principal, error::ApiError};

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /projects/:id/evidence` — newest submission first.
pub async fn list_for_project<S>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Evidence>>, ApiError>
where
  S: FieldStore + Clone + Send + Sync + 'static,
  ApiError: From<S::Error>,
{
  match principal.role() {
    Some(Role::Admin) => {}
    Some(Role::Supervisor) => {
      let project = state
        .store
        .get_project(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("project {project_id}")))?;
      if project.supervisor_id != principal.uid() {
        return Err(ApiError::Forbidden("not your project".into()));
      }
    }
    Some(Role::Operator) => {
      if !principal.account.assigned_projects.contains(&project_id) {
        return Err(ApiError::Forbidden("not assigned to this project".into()));
      }
    }
    None => return Err(ApiError::Forbidden("no role".into())),
  }

  Ok(Json(state.store.list_evidence(project_id).await?))
}

// ─── Submit ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /evidence`. The submitting operator is taken
/// from the authenticated principal, never from the body.
#[derive(Debug, Deserialize)]
pub struct SubmitEvidenceBody {
  pub project_id:       Uuid,
  pub kind:             MediaKind,
  pub media_url:        String,
  pub capture_location: GeoPoint,
  pub description:      String,
}

/// `POST /evidence` — returns 201 + the stored record in `pendiente`.
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Json(body): Json<SubmitEvidenceBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FieldStore + Clone + Send + Sync + 'static,
  ApiError: From<S::Error>,
{
  principal.require(Action::SubmitEvidence)?;

  let evidence = state
    .store
    .submit_evidence(NewEvidence {
      project_id:       body.project_id,
      operator_id:      principal.uid(),
      kind:             body.kind,
      media_url:        body.media_url,
      capture_location: body.capture_location,
      description:      body.description,
    })
    .await?;

  Ok((StatusCode::CREATED, Json(evidence)))
}

// ─── Review ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
  pub verdict: Verdict,
}

/// `POST /evidence/:id/review` — one verdict per record, ever; a second
/// attempt returns 409.
pub async fn review<S>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Path(evidence_id): Path<Uuid>,
  Json(body): Json<ReviewBody>,
) -> Result<Json<Evidence>, ApiError>
where
  S: FieldStore + Clone + Send + Sync + 'static,
  ApiError: From<S::Error>,
{
  principal.require(Action::ReviewEvidence)?;
  let evidence = state
    .store
    .review_evidence(principal.uid(), evidence_id, body.verdict)
    .await?;
  Ok(Json(evidence))
}

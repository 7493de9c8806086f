//! Handler for `GET /stats` — the admin statistics dashboard.

use axum::{Json, extract::State};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use contobra_core::{
  access::Action,
  metrics::{self, ProjectStats},
  store::{FieldStore, ProjectScope},
};

use crate::{AppState, auth::Principal, error::ApiError};

/// Derived metrics for one project.
#[derive(Debug, Serialize)]
pub struct ProjectStatsEntry {
  pub project_id: Uuid,
  pub name:       String,
  #[serde(flatten)]
  pub stats:      ProjectStats,
}

/// `GET /stats` — per-project derived metrics across every project.
///
/// Everything here is computed on read from the underlying collections;
/// nothing is persisted.
pub async fn overview<S>(
  State(state): State<AppState<S>>,
  principal: Principal,
) -> Result<Json<Vec<ProjectStatsEntry>>, ApiError>
where
  S: FieldStore + Clone + Send + Sync + 'static,
  ApiError: From<S::Error>,
{
  principal.require(Action::ViewStatistics)?;

  let now = Utc::now();
  let projects = state.store.list_projects(ProjectScope::All).await?;

  let mut entries = Vec::with_capacity(projects.len());
  for project in projects {
    let evidence = state.store.list_evidence(project.project_id).await?;
    entries.push(ProjectStatsEntry {
      project_id: project.project_id,
      name:       project.name.clone(),
      stats:      metrics::project_stats(&project, &evidence, now),
    });
  }

  Ok(Json(entries))
}

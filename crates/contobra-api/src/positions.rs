//! Handlers for live-position endpoints.
//!
//! | Method | Path | Who |
//! |--------|------|-----|
//! | `PUT`  | `/positions/me` | operator; overwrites own row |
//! | `GET`  | `/positions` | supervisor (the live map) |

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use uuid::Uuid;

use contobra_core::{
  access::Action,
  position::LivePosition,
  project::GeoPoint,
  store::FieldStore,
};

use crate::{AppState, auth::Principal, error::ApiError};

/// JSON body accepted by `PUT /positions/me`. `active_project` is absent
/// when the operator has no obra open on their device.
#[derive(Debug, Deserialize)]
pub struct PositionBody {
  pub position:       GeoPoint,
  pub active_project: Option<Uuid>,
}

/// `PUT /positions/me` — returns 204. Only the latest fix survives.
pub async fn update_own<S>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Json(body): Json<PositionBody>,
) -> Result<StatusCode, ApiError>
where
  S: FieldStore + Clone + Send + Sync + 'static,
  ApiError: From<S::Error>,
{
  principal.require(Action::BroadcastOwnPosition)?;

  state
    .store
    .upsert_position(LivePosition {
      operator_id:    principal.uid(),
      position:       body.position,
      updated_at:     chrono::Utc::now(),
      active_project: body.active_project,
    })
    .await?;

  Ok(StatusCode::NO_CONTENT)
}

/// `GET /positions` — every operator's current position.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  principal: Principal,
) -> Result<Json<Vec<LivePosition>>, ApiError>
where
  S: FieldStore + Clone + Send + Sync + 'static,
  ApiError: From<S::Error>,
{
  principal.require(Action::ViewLivePositions)?;
  Ok(Json(state.store.list_positions().await?))
}

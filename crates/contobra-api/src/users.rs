//! Handlers for `/users` endpoints.
//!
//! | Method | Path | Who |
//! |--------|------|-----|
//! | `GET`  | `/users` | admin; supervisors may list operators only |
//! | `POST` | `/users` | admin; returns 201 + the new account |
//! | `PUT`  | `/users/:id/role` | admin |
//! | `PUT`  | `/users/:id/assignments` | supervisor; full-replace write |

use std::collections::BTreeSet;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use contobra_core::{
  access::Action,
  store::FieldStore,
  user::{NewUser, Role, UserAccount},
};

use crate::{AppState, auth::{Principal, hash_password}, error::ApiError};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub role: Option<Role>,
}

/// `GET /users[?role=operador]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<UserAccount>>, ApiError>
where
  S: FieldStore + Clone + Send + Sync + 'static,
  ApiError: From<S::Error>,
{
  // Admins see everyone. A supervisor only ever needs the operator list,
  // to build assignments; any other slice is off limits.
  match principal.role() {
    Some(Role::Admin) => {}
    Some(Role::Supervisor) if params.role == Some(Role::Operator) => {}
    _ => {
      return Err(ApiError::Forbidden("cannot list these accounts".into()));
    }
  }

  Ok(Json(state.store.list_users(params.role).await?))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /users`. The plaintext password is hashed
/// here and never stored.
#[derive(Debug, Deserialize)]
pub struct CreateUserBody {
  pub name:     String,
  pub email:    String,
  pub password: String,
  pub role:     Option<Role>,
}

/// `POST /users` — returns 201 + the stored account.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Json(body): Json<CreateUserBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FieldStore + Clone + Send + Sync + 'static,
  ApiError: From<S::Error>,
{
  principal.require(Action::CreateUser)?;

  let account = state
    .store
    .create_user(NewUser {
      name:          body.name,
      email:         body.email,
      password_hash: hash_password(&body.password)?,
      role:          body.role,
    })
    .await?;

  Ok((StatusCode::CREATED, Json(account)))
}

// ─── Role ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SetRoleBody {
  pub role: Role,
}

/// `PUT /users/:id/role`
pub async fn set_role<S>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Path(uid): Path<Uuid>,
  Json(body): Json<SetRoleBody>,
) -> Result<Json<UserAccount>, ApiError>
where
  S: FieldStore + Clone + Send + Sync + 'static,
  ApiError: From<S::Error>,
{
  principal.require(Action::UpdateRole)?;
  Ok(Json(state.store.set_role(uid, body.role).await?))
}

// ─── Assignments ─────────────────────────────────────────────────────────────

/// The complete new assignment set; whatever the operator had before is
/// replaced wholesale.
#[derive(Debug, Deserialize)]
pub struct SetAssignmentsBody {
  pub projects: Vec<Uuid>,
}

/// `PUT /users/:id/assignments`
pub async fn set_assignments<S>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Path(operator_id): Path<Uuid>,
  Json(body): Json<SetAssignmentsBody>,
) -> Result<Json<UserAccount>, ApiError>
where
  S: FieldStore + Clone + Send + Sync + 'static,
  ApiError: From<S::Error>,
{
  principal.require(Action::AssignOperators)?;

  let projects: BTreeSet<Uuid> = body.projects.into_iter().collect();
  let account = state
    .store
    .assign_projects(principal.uid(), operator_id, projects)
    .await?;
  Ok(Json(account))
}

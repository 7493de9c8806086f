//! JSON REST API for ContObra.
//!
//! Exposes an axum [`Router`] backed by any
//! [`contobra_core::store::FieldStore`]. Every route authenticates with
//! HTTP Basic against the user table, resolves the account's role, and
//! checks the role table before touching the store — the server never
//! trusts the client to have gated anything.

pub mod auth;
pub mod error;
pub mod evidence;
pub mod positions;
pub mod projects;
pub mod session;
pub mod stats;
pub mod users;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post, put},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use contobra_core::store::FieldStore;

pub use error::ApiError;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
///
/// The `admin_*` fields describe the bootstrap administrator account,
/// created at startup when no account with that email exists yet.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  pub admin_name:          String,
  pub admin_email:         String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub admin_password_hash: String,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: FieldStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the ContObra API.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: FieldStore + Clone + Send + Sync + 'static,
  ApiError: From<S::Error>,
{
  Router::new()
    // Session
    .route("/session", get(session::show))
    // Users
    .route("/users", get(users::list::<S>).post(users::create::<S>))
    .route("/users/{id}/role", put(users::set_role::<S>))
    .route("/users/{id}/assignments", put(users::set_assignments::<S>))
    // Projects
    .route(
      "/projects",
      get(projects::list::<S>).post(projects::create::<S>),
    )
    .route(
      "/projects/{id}",
      put(projects::update::<S>).patch(projects::update_details::<S>),
    )
    .route("/projects/{id}/evidence", get(evidence::list_for_project::<S>))
    // Evidence
    .route("/evidence", post(evidence::submit::<S>))
    .route("/evidence/{id}/review", post(evidence::review::<S>))
    // Live positions
    .route("/positions/me", put(positions::update_own::<S>))
    .route("/positions", get(positions::list::<S>))
    // Statistics
    .route("/stats", get(stats::overview::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ───────────────────────────────────────────────────────

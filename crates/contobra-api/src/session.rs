//! Handler for `GET /session`.

use axum::Json;
use serde::Serialize;

use contobra_core::{
  access::{self, Screen},
  session::AuthUser,
  user::Role,
};

use crate::auth::Principal;

/// What a signed-in client needs to decide which surfaces to mount.
#[derive(Debug, Serialize)]
pub struct SessionInfo {
  pub user:    AuthUser,
  /// Absent when the stored role is missing or unrecognised; nothing
  /// mounts in that case.
  pub role:    Option<Role>,
  pub screens: &'static [Screen],
}

/// `GET /session` — the resolved session for the authenticated principal.
pub async fn show(principal: Principal) -> Json<SessionInfo> {
  let role = principal.role();
  Json(SessionInfo {
    user: AuthUser {
      uid:   principal.uid(),
      email: principal.account.email.clone(),
    },
    role,
    screens: access::screens_for(role),
  })
}

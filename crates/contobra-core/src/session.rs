//! Session resolution — identity from the credential verifier, role from
//! the user record.
//!
//! The session is an explicitly constructed, explicitly injected object,
//! never ambient global state: anything that needs the current identity or
//! role takes a [`Session`] (or its state) as a parameter, which keeps the
//! whole thing testable with fabricated verifiers.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use uuid::Uuid;

use crate::{
  access::{self, Screen},
  store::FieldStore,
  user::Role,
};

// ─── Verifier contract ───────────────────────────────────────────────────────

/// Why a sign-in attempt failed. Surfaced to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
  #[error("invalid email address")]
  InvalidEmail,

  #[error("no account for that email")]
  NotFound,

  #[error("wrong password")]
  WrongPassword,

  #[error("authentication failed: {0}")]
  Unknown(String),
}

/// The authenticated principal as reported by the credential verifier.
/// Carries identity only; the role lives on the user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthUser {
  pub uid:   Uuid,
  pub email: String,
}

/// An opaque credential verifier.
///
/// Implementations hold whatever secret material they need; this crate only
/// consumes the contract: sign in, sign out, and a watchable stream of the
/// current principal.
pub trait CredentialVerifier: Send + Sync {
  fn sign_in<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl std::future::Future<Output = Result<AuthUser, AuthError>> + Send + 'a;

  fn sign_out(&self) -> impl std::future::Future<Output = ()> + Send + '_;

  /// The current principal, updated on every sign-in/sign-out.
  fn principal(&self) -> watch::Receiver<Option<AuthUser>>;
}

// ─── Session state ───────────────────────────────────────────────────────────

/// What the rest of the application sees: who is signed in, what role they
/// resolved to, and whether resolution is still in flight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
  pub user:      Option<AuthUser>,
  pub role:      Option<Role>,
  pub resolving: bool,
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// The process-wide session context.
///
/// Exactly one listener task attaches to the verifier's principal stream
/// for the lifetime of the session. On every principal change the task
/// fetches the matching user record and publishes the resolved state. An
/// authenticated principal with no record resolves to no role — the user is
/// authenticated but unauthorized, and nothing mounts (fails closed).
pub struct Session<V> {
  verifier: Arc<V>,
  state:    watch::Receiver<SessionState>,
  task:     tokio::task::JoinHandle<()>,
}

impl<V: CredentialVerifier + 'static> Session<V> {
  /// Attach to `verifier` and start resolving roles against `store`.
  pub fn attach<S>(verifier: Arc<V>, store: Arc<S>) -> Self
  where
    S: FieldStore + 'static,
  {
    let mut principal = verifier.principal();
    let (tx, rx) = watch::channel(SessionState {
      user:      None,
      role:      None,
      resolving: true,
    });

    let task = tokio::spawn(async move {
      loop {
        let current = principal.borrow_and_update().clone();
        let state = match current {
          Some(user) => {
            let role = resolve_role(store.as_ref(), user.uid).await;
            SessionState { user: Some(user), role, resolving: false }
          }
          // Signed out: (none, none, false).
          None => SessionState::default(),
        };

        if tx.send(state).is_err() {
          break;
        }
        if principal.changed().await.is_err() {
          break;
        }
      }
    });

    Self { verifier, state: rx, task }
  }

  /// The current session state.
  pub fn state(&self) -> SessionState { self.state.borrow().clone() }

  /// Wait for the next state transition. Returns `None` once the verifier
  /// stream has closed.
  pub async fn changed(&mut self) -> Option<SessionState> {
    match self.state.changed().await {
      Ok(()) => Some(self.state.borrow_and_update().clone()),
      Err(_) => None,
    }
  }

  /// Screens the current role may mount; empty when signed out or when the
  /// role is missing/unknown.
  pub fn screens(&self) -> &'static [Screen] {
    access::screens_for(self.state.borrow().role)
  }

  /// Delegate to the verifier. The failure reason is surfaced unchanged;
  /// the resolved identity arrives through the state stream.
  pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
    self.verifier.sign_in(email, password).await.map(|_| ())
  }

  /// Delegate to the verifier; the state stream resets to signed-out.
  pub async fn sign_out(&self) { self.verifier.sign_out().await; }
}

impl<V> Drop for Session<V> {
  fn drop(&mut self) { self.task.abort(); }
}

/// Fetch the user record and read its role verbatim. Absent records and
/// lookup failures both resolve to no role, with a diagnostic.
async fn resolve_role<S: FieldStore>(store: &S, uid: Uuid) -> Option<Role> {
  match store.get_user(uid).await {
    Ok(Some(account)) => account.role,
    Ok(None) => {
      tracing::error!(%uid, "authenticated principal has no user record");
      None
    }
    Err(e) => {
      tracing::error!(%uid, "role lookup failed: {e}");
      None
    }
  }
}

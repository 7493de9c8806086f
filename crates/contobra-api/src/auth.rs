//! HTTP Basic-auth extractor and the store-backed credential verifier.
//!
//! Every request authenticates against the `users` table: the Basic
//! credentials name an account email, the password is checked against the
//! stored argon2 hash, and the resolved [`Principal`] carries the full
//! account record so handlers can consult the role table without another
//! store round-trip.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use rand_core::OsRng;
use tokio::sync::watch;
use uuid::Uuid;

use contobra_core::{
  access::{self, Action},
  session::{AuthError, AuthUser, CredentialVerifier},
  store::FieldStore,
  user::{Role, UserAccount},
};

use crate::{AppState, error::ApiError};

// ─── Principal ───────────────────────────────────────────────────────────────

/// The authenticated account behind the current request.
pub struct Principal {
  pub account: UserAccount,
}

impl Principal {
  pub fn uid(&self) -> Uuid { self.account.uid }

  pub fn role(&self) -> Option<Role> { self.account.role }

  /// Fail with 403 unless the principal's role reaches `action`.
  pub fn require(&self, action: Action) -> Result<(), ApiError> {
    if access::permits(self.role(), action) {
      Ok(())
    } else {
      Err(ApiError::Forbidden(format!(
        "role does not permit {action:?}"
      )))
    }
  }
}

/// Verify credentials directly from headers.
pub async fn verify_auth<S>(
  headers: &HeaderMap,
  store: &S,
) -> Result<UserAccount, ApiError>
where
  S: FieldStore,
  ApiError: From<S::Error>,
{
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

  let (email, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;

  let stored = store
    .credentials_for(email)
    .await?
    .ok_or(ApiError::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&stored.password_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  store
    .get_user(stored.uid)
    .await?
    .ok_or(ApiError::Unauthorized)
}

impl<S> FromRequestParts<AppState<S>> for Principal
where
  S: FieldStore + Clone + Send + Sync + 'static,
  ApiError: From<S::Error>,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let account = verify_auth(&parts.headers, state.store.as_ref()).await?;
    Ok(Principal { account })
  }
}

// ─── Password hashing ────────────────────────────────────────────────────────

/// Hash a plaintext password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::BadRequest(format!("cannot hash password: {e}")))
}

// ─── Store-backed verifier ───────────────────────────────────────────────────

/// [`CredentialVerifier`] backed by a [`FieldStore`], for embedding a
/// [`contobra_core::session::Session`] in-process.
pub struct StoreVerifier<S> {
  store:     S,
  principal: watch::Sender<Option<AuthUser>>,
}

impl<S> StoreVerifier<S> {
  pub fn new(store: S) -> Self {
    let (principal, _) = watch::channel(None);
    Self { store, principal }
  }
}

impl<S> CredentialVerifier for StoreVerifier<S>
where
  S: FieldStore,
{
  async fn sign_in(
    &self,
    email: &str,
    password: &str,
  ) -> Result<AuthUser, AuthError> {
    if !email.contains('@') {
      return Err(AuthError::InvalidEmail);
    }

    let stored = self
      .store
      .credentials_for(email)
      .await
      .map_err(|e| AuthError::Unknown(e.to_string()))?
      .ok_or(AuthError::NotFound)?;

    let parsed_hash = PasswordHash::new(&stored.password_hash)
      .map_err(|e| AuthError::Unknown(e.to_string()))?;

    Argon2::default()
      .verify_password(password.as_bytes(), &parsed_hash)
      .map_err(|_| AuthError::WrongPassword)?;

    let user = AuthUser { uid: stored.uid, email: email.to_owned() };
    self.principal.send_replace(Some(user.clone()));
    Ok(user)
  }

  async fn sign_out(&self) {
    self.principal.send_replace(None);
  }

  fn principal(&self) -> watch::Receiver<Option<AuthUser>> {
    self.principal.subscribe()
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::http::{Request, header};
  use contobra_core::{
    session::Session,
    user::{NewUser, Role},
  };
  use contobra_store_sqlite::SqliteStore;

  use super::*;
  use crate::{AppState, ServerConfig};

  async fn store_with_user(password: &str) -> SqliteStore {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store
      .create_user(NewUser {
        name:          "Laura".into(),
        email:         "laura@contobra.example".into(),
        password_hash: hash_password(password).unwrap(),
        role:          Some(Role::Supervisor),
      })
      .await
      .unwrap();
    store
  }

  fn make_state(store: SqliteStore) -> AppState<SqliteStore> {
    AppState {
      store:  Arc::new(store),
      config: Arc::new(ServerConfig {
        host:                "127.0.0.1".to_string(),
        port:                7070,
        store_path:          std::path::PathBuf::from(":memory:"),
        admin_name:          "Admin".to_string(),
        admin_email:         "admin@contobra.example".to_string(),
        admin_password_hash: "unused".to_string(),
      }),
    }
  }

  fn basic(email: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{email}:{pass}")))
  }

  async fn extract(
    req: Request<axum::body::Body>,
    state: &AppState<SqliteStore>,
  ) -> Result<Principal, ApiError> {
    let (mut parts, _) = req.into_parts();
    Principal::from_request_parts(&mut parts, state).await
  }

  #[tokio::test]
  async fn correct_credentials_resolve_the_account() {
    let state = make_state(store_with_user("secret").await);
    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("laura@contobra.example", "secret"))
      .body(axum::body::Body::empty())
      .unwrap();

    let principal = extract(req, &state).await.unwrap();
    assert_eq!(principal.role(), Some(Role::Supervisor));
    assert!(principal.require(Action::AssignOperators).is_ok());
    assert!(principal.require(Action::CreateUser).is_err());
  }

  #[tokio::test]
  async fn wrong_password_is_unauthorized() {
    let state = make_state(store_with_user("secret").await);
    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("laura@contobra.example", "wrong"))
      .body(axum::body::Body::empty())
      .unwrap();
    assert!(matches!(
      extract(req, &state).await,
      Err(ApiError::Unauthorized)
    ));
  }

  #[tokio::test]
  async fn unknown_email_is_unauthorized() {
    let state = make_state(store_with_user("secret").await);
    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("ghost@contobra.example", "secret"))
      .body(axum::body::Body::empty())
      .unwrap();
    assert!(matches!(
      extract(req, &state).await,
      Err(ApiError::Unauthorized)
    ));
  }

  #[tokio::test]
  async fn missing_header_is_unauthorized() {
    let state = make_state(store_with_user("secret").await);
    let req = Request::builder().body(axum::body::Body::empty()).unwrap();
    assert!(matches!(
      extract(req, &state).await,
      Err(ApiError::Unauthorized)
    ));
  }

  // ── StoreVerifier ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn store_verifier_sign_in_reports_distinct_failures() {
    let verifier = StoreVerifier::new(store_with_user("secret").await);

    assert_eq!(
      verifier.sign_in("not-an-email", "secret").await.unwrap_err(),
      AuthError::InvalidEmail
    );
    assert_eq!(
      verifier
        .sign_in("ghost@contobra.example", "secret")
        .await
        .unwrap_err(),
      AuthError::NotFound
    );
    assert_eq!(
      verifier
        .sign_in("laura@contobra.example", "wrong")
        .await
        .unwrap_err(),
      AuthError::WrongPassword
    );

    let user = verifier
      .sign_in("laura@contobra.example", "secret")
      .await
      .unwrap();
    assert_eq!(user.email, "laura@contobra.example");
  }

  #[tokio::test]
  async fn session_resolves_role_through_store_verifier() {
    let store = Arc::new(store_with_user("secret").await);
    let verifier = Arc::new(StoreVerifier::new(store.as_ref().clone()));

    let mut session = Session::attach(verifier, store);
    session
      .sign_in("laura@contobra.example", "secret")
      .await
      .unwrap();

    // Skip states until resolution lands on the supervisor role.
    loop {
      let state = session.changed().await.expect("session task alive");
      if state.role == Some(Role::Supervisor) {
        assert!(!state.resolving);
        break;
      }
    }

    session.sign_out().await;
    loop {
      let state = session.changed().await.expect("session task alive");
      if state.user.is_none() {
        assert_eq!(state.role, None);
        break;
      }
    }
  }
}

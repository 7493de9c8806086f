//! User accounts and roles.
//!
//! An account's role decides which screens mount and which store operations
//! it may invoke. Role strings on the wire are fixed: `"admin"`,
//! `"supervisor"`, `"operador"`. Anything else resolves to no role at all,
//! which fails closed everywhere.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Role ────────────────────────────────────────────────────────────────────

/// The three recognised roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
  #[serde(rename = "admin")]
  Admin,
  #[serde(rename = "supervisor")]
  Supervisor,
  #[serde(rename = "operador")]
  Operator,
}

impl Role {
  /// The literal stored in the database and sent on the wire.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Admin => "admin",
      Self::Supervisor => "supervisor",
      Self::Operator => "operador",
    }
  }

  /// Parse a stored role string. Unknown strings map to `None` rather than
  /// an error: an unrecognised role must degrade to "no role", not crash.
  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "admin" => Some(Self::Admin),
      "supervisor" => Some(Self::Supervisor),
      "operador" => Some(Self::Operator),
      _ => None,
    }
  }
}

// ─── Accounts ────────────────────────────────────────────────────────────────

/// A user profile record.
///
/// Credentials (the argon2 password hash) are deliberately not part of this
/// type; they never leave the store except through
/// [`crate::store::FieldStore::credentials_for`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
  pub uid:               Uuid,
  pub name:              String,
  pub email:             String,
  /// `None` when the stored role is absent or unrecognised.
  pub role:              Option<Role>,
  /// Projects this operator may submit evidence for. Empty for other roles.
  pub assigned_projects: BTreeSet<Uuid>,
  pub created_at:        DateTime<Utc>,
}

impl UserAccount {
  pub fn is_operator(&self) -> bool { self.role == Some(Role::Operator) }
}

/// Input to [`crate::store::FieldStore::create_user`].
/// `uid` and `created_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub name:          String,
  pub email:         String,
  /// argon2 PHC string, e.g. `$argon2id$v=19$…`. Hashing happens at the
  /// boundary that accepts the plaintext password.
  pub password_hash: String,
  pub role:          Option<Role>,
}

/// The credential material the verifier checks a password against.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub uid:           Uuid,
  pub password_hash: String,
}

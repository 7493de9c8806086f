//! Error type for `contobra-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Domain-rule violations (not found, already reviewed, scope, …).
  #[error("core error: {0}")]
  Core(#[from] contobra_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored row did not decode into its domain type. Such rows are
  /// rejected here rather than propagated untyped.
  #[error("malformed row: {0}")]
  Decode(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

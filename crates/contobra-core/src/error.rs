//! Error types for `contobra-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("project not found: {0}")]
  ProjectNotFound(Uuid),

  #[error("evidence not found: {0}")]
  EvidenceNotFound(Uuid),

  #[error("evidence {0} has already been reviewed")]
  AlreadyReviewed(Uuid),

  #[error("user {0} is not an operator")]
  NotAnOperator(Uuid),

  #[error("operator {0} is not assigned to project {1}")]
  NotAssigned(Uuid, Uuid),

  #[error("project {0} belongs to another supervisor")]
  ForeignProject(Uuid),

  #[error("geofence radius must be a non-negative number of meters, got {0}")]
  InvalidRadius(f64),

  #[error("start date is after the estimated end date")]
  InvalidDates,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use contobra_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => {
        (StatusCode::UNAUTHORIZED, "unauthorized".to_string())
      }
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    let mut response =
      (status, Json(json!({ "error": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        header::HeaderValue::from_static("Basic realm=\"contobra\""),
      );
    }
    response
  }
}

/// Domain errors map onto HTTP statuses; everything else is a 500.
impl From<CoreError> for ApiError {
  fn from(e: CoreError) -> Self {
    match e {
      CoreError::UserNotFound(_)
      | CoreError::ProjectNotFound(_)
      | CoreError::EvidenceNotFound(_) => ApiError::NotFound(e.to_string()),
      CoreError::AlreadyReviewed(_) => ApiError::Conflict(e.to_string()),
      CoreError::NotAnOperator(_)
      | CoreError::NotAssigned(_, _)
      | CoreError::ForeignProject(_) => ApiError::Forbidden(e.to_string()),
      CoreError::InvalidRadius(_) | CoreError::InvalidDates => {
        ApiError::BadRequest(e.to_string())
      }
      CoreError::Serialization(_) => ApiError::Store(Box::new(e)),
    }
  }
}

impl From<contobra_store_sqlite::Error> for ApiError {
  fn from(e: contobra_store_sqlite::Error) -> Self {
    match e {
      contobra_store_sqlite::Error::Core(core) => ApiError::from(core),
      other => ApiError::Store(Box::new(other)),
    }
  }
}

impl From<std::convert::Infallible> for ApiError {
  fn from(e: std::convert::Infallible) -> Self { match e {} }
}

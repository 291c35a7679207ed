//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure renders as
//! `{"error": {"code": …, "message": …, "details": {…}}}` so clients can
//! branch on `code` and show `details` (an earliest start date, a day limit)
//! without parsing the message.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use leavebook_core::Error as CoreError;
use serde_json::{Value, json};
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("authentication required")]
  Unauthenticated,

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Domain(#[from] CoreError),
}

impl ApiError {
  /// Lift a store error into the domain taxonomy.
  pub fn store<E: Into<CoreError>>(err: E) -> Self { Self::Domain(err.into()) }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::Unauthenticated => StatusCode::UNAUTHORIZED,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Domain(e) if e.is_eligibility_failure() => StatusCode::UNPROCESSABLE_ENTITY,
      Self::Domain(e) => match e {
        CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        CoreError::Forbidden { .. } => StatusCode::FORBIDDEN,
        CoreError::InvalidStateTransition { .. }
        | CoreError::OverlappingRequest { .. }
        | CoreError::NoEscalationTargetFound { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }

  fn code(&self) -> &'static str {
    match self {
      Self::Unauthenticated => "unauthenticated",
      Self::BadRequest(_) => "bad_request",
      Self::Domain(e) => e.code(),
    }
  }

  fn details(&self) -> Value {
    match self {
      Self::Domain(e) => e.details(),
      _ => json!({}),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    let body = json!({
      "error": {
        "code":    self.code(),
        "message": self.to_string(),
        "details": self.details(),
      }
    });
    (status, Json(body)).into_response()
  }
}

//! The authenticated caller of a handler.

use axum::{extract::FromRequestParts, http::request::Parts};
use leavebook_core::directory::Session;

use crate::error::ApiError;

/// The [`Session`] an outer authentication layer placed in the request
/// extensions. Handlers taking a `Caller` reject unauthenticated requests
/// with 401.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Session);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<Session>()
      .copied()
      .map(Caller)
      .ok_or(ApiError::Unauthenticated)
  }
}

//! HTTP Basic authentication and the session layer in front of the API.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use leavebook_core::{UserId, store::LeaveStore};

use crate::{AccountConfig, AppState, error::Error};

/// Logins accepted by this server instance.
#[derive(Clone, Default)]
pub struct AuthConfig {
  pub accounts: Vec<AccountConfig>,
}

impl AuthConfig {
  fn account(&self, username: &str) -> Option<&AccountConfig> {
    self.accounts.iter().find(|a| a.username == username)
  }
}

/// Verify Basic credentials and return the directory user they log in as.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<UserId, Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  let account = config.account(username).ok_or(Error::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&account.password_hash)
    .map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(account.user_id)
}

/// Middleware: authenticate the caller, resolve their directory entry, and
/// hand the resulting session to the API through the request extensions.
pub async fn authenticate<S>(
  State(state): State<AppState<S>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error>
where
  S: LeaveStore + 'static,
{
  let user_id = verify_auth(req.headers(), &state.auth)?;

  let profile = state
    .store
    .get_user(user_id)
    .await
    .map_err(|e| Error::Store(e.into()))?
    .filter(|p| p.is_active);
  let Some(profile) = profile else {
    tracing::warn!(user_id, "login for a missing or inactive directory user");
    return Err(Error::Unauthorized);
  };

  req.extensions_mut().insert(profile.session());
  Ok(next.run(req).await)
}

//! HTTP server for Leavebook.
//!
//! Wraps the JSON API from [`leavebook_api`] with HTTP Basic authentication,
//! request tracing, a health probe, and the optional auto-escalation sweep.

pub mod auth;
pub mod error;
pub mod sweep;

pub use error::Error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{Router, middleware, routing::get};
use leavebook_core::{
  directory::UserProfile,
  escalation::SweepPolicy,
  notify::Notifier,
  registry::NewLeaveType,
  store::LeaveStore,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::AuthConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

/// A login accepted by the server, bound to one directory user.
#[derive(Deserialize, Clone)]
pub struct AccountConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  pub user_id:       i64,
}

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                      String,
  pub port:                      u16,
  pub store_path:                PathBuf,
  #[serde(default)]
  pub accounts:                  Vec<AccountConfig>,
  /// Directory entries upserted at startup.
  #[serde(default)]
  pub users:                     Vec<UserProfile>,
  /// Leave types shared by every company, created at startup if missing.
  #[serde(default)]
  pub global_leave_types:        Vec<NewLeaveType>,
  /// Enables the sweep when set.
  #[serde(default)]
  pub auto_escalate_after_hours: Option<u64>,
  #[serde(default = "default_sweep_interval")]
  pub sweep_interval_secs:       u64,
}

fn default_sweep_interval() -> u64 { 300 }

impl ServerConfig {
  /// The sweep settings, or `None` when the sweep is off.
  pub fn sweep_policy(&self) -> Result<Option<SweepPolicy>, leavebook_core::Error> {
    self.auto_escalate_after_hours.map(SweepPolicy::from_hours).transpose()
  }

  pub fn sweep_interval(&self) -> Duration {
    Duration::from_secs(self.sweep_interval_secs.max(1))
  }

  pub fn auth(&self) -> AuthConfig {
    AuthConfig { accounts: self.accounts.clone() }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state for the authentication layer.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub auth:     Arc<AuthConfig>,
  pub notifier: Arc<dyn Notifier>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      auth:     Arc::clone(&self.auth),
      notifier: Arc::clone(&self.notifier),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full server [`Router`]: `/health` plus the authenticated API
/// under `/api`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: LeaveStore + 'static,
{
  let api = leavebook_api::api_router(state.store.clone(), state.notifier.clone())
    .layer(middleware::from_fn_with_state(state, auth::authenticate::<S>));

  Router::new()
    .route("/health", get(health))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str { "ok" }

//! JSON REST API for Leavebook.
//!
//! Exposes an axum [`Router`] backed by any
//! [`LeaveStore`](leavebook_core::store::LeaveStore). Authentication is the
//! caller's responsibility: an outer layer must insert the authenticated
//! [`Session`](leavebook_core::directory::Session) into the request
//! extensions, where the [`Caller`] extractor picks it up.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", leavebook_api::api_router(store.clone(), notifier).layer(auth))
//! ```

pub mod balances;
pub mod caller;
pub mod error;
pub mod registry;
pub mod requests;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use leavebook_core::{notify::Notifier, store::LeaveStore};

pub use caller::Caller;
pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:    Arc<S>,
  /// Receives lifecycle events after each committed transition.
  pub notifier: Arc<dyn Notifier>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      notifier: Arc::clone(&self.notifier),
    }
  }
}

/// Build the API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, notifier: Arc<dyn Notifier>) -> Router<()>
where
  S: LeaveStore + 'static,
{
  Router::new()
    // Requests
    .route("/requests", post(requests::submit::<S>))
    .route("/requests/mine", get(requests::mine::<S>))
    .route("/requests/review", get(requests::review::<S>))
    .route("/requests/{id}/process", post(requests::process::<S>))
    .route("/requests/{id}/resolve", post(requests::resolve::<S>))
    // Ledger
    .route("/balances", get(balances::list::<S>))
    .route("/balances/initialize", post(balances::initialize::<S>))
    // Registry & directory
    .route("/leave-types", get(registry::list::<S>).post(registry::create::<S>))
    .route("/leave-types/{id}/policy", put(registry::set_policy::<S>))
    .route("/users/{id}", put(registry::upsert_user::<S>))
    .with_state(ApiState { store, notifier })
}

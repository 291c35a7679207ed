//! Handlers for `/requests` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/requests` | Body: [`DraftRequest`]; returns 201 + [`Submitted`] |
//! | `GET`  | `/requests/mine` | Caller's requests, newest first |
//! | `GET`  | `/requests/review` | Requests awaiting the caller's decision |
//! | `POST` | `/requests/{id}/process` | Body: [`ProcessBody`] |
//! | `POST` | `/requests/{id}/resolve` | Body: [`ResolveBody`] |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use leavebook_core::{
  lifecycle::{FinalAction, ReviewAction},
  notify::LeaveEvent,
  request::{DraftRequest, LeaveStatus, RequestView},
  store::{Decision, LeaveStore},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiState, caller::Caller, error::ApiError};

// ─── Submit ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct Submitted {
  pub request_id:     Uuid,
  pub status:         LeaveStatus,
  pub days_requested: i64,
}

/// `POST /requests`
pub async fn submit<S: LeaveStore>(
  State(state): State<ApiState<S>>,
  Caller(session): Caller,
  Json(draft): Json<DraftRequest>,
) -> Result<impl IntoResponse, ApiError> {
  let today = Utc::now().date_naive();
  let request = state
    .store
    .submit(session, draft, today)
    .await
    .map_err(ApiError::store)?;

  state.notifier.notify(LeaveEvent::submitted(&request));
  Ok((StatusCode::CREATED, Json(Submitted {
    request_id:     request.request_id,
    status:         request.status,
    days_requested: request.days_requested,
  })))
}

// ─── Lists ───────────────────────────────────────────────────────────────────

/// `GET /requests/mine`
pub async fn mine<S: LeaveStore>(
  State(state): State<ApiState<S>>,
  Caller(session): Caller,
) -> Result<Json<Vec<RequestView>>, ApiError> {
  let views = state.store.list_mine(session).await.map_err(ApiError::store)?;
  Ok(Json(views))
}

/// `GET /requests/review`
pub async fn review<S: LeaveStore>(
  State(state): State<ApiState<S>>,
  Caller(session): Caller,
) -> Result<Json<Vec<RequestView>>, ApiError> {
  let views = state
    .store
    .list_pending_for_review(session)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(views))
}

// ─── Decisions ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProcessBody {
  pub action: ReviewAction,
  /// Required for `reject` and `escalate`.
  #[serde(default)]
  pub reason: Option<String>,
}

/// `POST /requests/{id}/process`
pub async fn process<S: LeaveStore>(
  State(state): State<ApiState<S>>,
  Caller(session): Caller,
  Path(request_id): Path<Uuid>,
  Json(body): Json<ProcessBody>,
) -> Result<Json<Decision>, ApiError> {
  let decision = state
    .store
    .process(session, request_id, body.action, body.reason)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(announce(&state, decision)))
}

#[derive(Debug, Deserialize)]
pub struct ResolveBody {
  pub resolution_notes: String,
  pub final_action:     FinalAction,
}

/// `POST /requests/{id}/resolve`
pub async fn resolve<S: LeaveStore>(
  State(state): State<ApiState<S>>,
  Caller(session): Caller,
  Path(request_id): Path<Uuid>,
  Json(body): Json<ResolveBody>,
) -> Result<Json<Decision>, ApiError> {
  let decision = state
    .store
    .resolve_escalation(session, request_id, body.resolution_notes, body.final_action)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(announce(&state, decision)))
}

fn announce<S>(state: &ApiState<S>, decision: Decision) -> Decision {
  for event in LeaveEvent::from_decision(&decision) {
    state.notifier.notify(event);
  }
  decision
}

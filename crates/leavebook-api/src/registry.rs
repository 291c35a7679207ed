//! Handlers for leave type, policy and directory endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/leave-types` | Active types visible to the caller's company |
//! | `POST` | `/leave-types` | Body: [`NewLeaveType`]; returns 201 |
//! | `PUT`  | `/leave-types/{id}/policy` | Body: [`PolicyBody`] |
//! | `PUT`  | `/users/{id}` | Body: [`UserProfile`]; management only |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use leavebook_core::{
  LeaveTypeId, UserId,
  directory::{Gender, UserProfile},
  registry::{LeavePolicy, LeaveTypeEntry, NewLeaveType},
  store::LeaveStore,
};
use serde::Deserialize;

use crate::{ApiState, caller::Caller, error::ApiError};

/// `GET /leave-types`
pub async fn list<S: LeaveStore>(
  State(state): State<ApiState<S>>,
  Caller(session): Caller,
) -> Result<Json<Vec<LeaveTypeEntry>>, ApiError> {
  let types = state
    .store
    .list_leave_types(session)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(types))
}

/// `POST /leave-types`
pub async fn create<S: LeaveStore>(
  State(state): State<ApiState<S>>,
  Caller(session): Caller,
  Json(body): Json<NewLeaveType>,
) -> Result<impl IntoResponse, ApiError> {
  let leave_type = state
    .store
    .create_leave_type(session, body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(leave_type)))
}

/// A policy as sent by clients; the leave type comes from the path.
#[derive(Debug, Deserialize)]
pub struct PolicyBody {
  #[serde(default)]
  pub notice_period_days:   i64,
  #[serde(default)]
  pub max_consecutive_days: Option<i64>,
  #[serde(default)]
  pub min_service_days:     i64,
  #[serde(default)]
  pub gender_specific:      Option<Gender>,
  pub default_days:         i64,
  #[serde(default)]
  pub carry_forward_days:   i64,
}

impl PolicyBody {
  fn for_type(self, leave_type_id: LeaveTypeId) -> LeavePolicy {
    LeavePolicy {
      leave_type_id,
      notice_period_days: self.notice_period_days,
      max_consecutive_days: self.max_consecutive_days,
      min_service_days: self.min_service_days,
      gender_specific: self.gender_specific,
      default_days: self.default_days,
      carry_forward_days: self.carry_forward_days,
    }
  }
}

/// `PUT /leave-types/{id}/policy`
pub async fn set_policy<S: LeaveStore>(
  State(state): State<ApiState<S>>,
  Caller(session): Caller,
  Path(leave_type_id): Path<LeaveTypeId>,
  Json(body): Json<PolicyBody>,
) -> Result<Json<LeavePolicy>, ApiError> {
  let policy = state
    .store
    .set_policy(session, body.for_type(leave_type_id))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(policy))
}

/// `PUT /users/{id}`
///
/// Management may create or update users of their own company, and may not
/// move a user in from another company.
pub async fn upsert_user<S: LeaveStore>(
  State(state): State<ApiState<S>>,
  Caller(session): Caller,
  Path(user_id): Path<UserId>,
  Json(profile): Json<UserProfile>,
) -> Result<Json<UserProfile>, ApiError> {
  if profile.user_id != user_id {
    return Err(ApiError::BadRequest(format!(
      "body user_id {} does not match path {user_id}",
      profile.user_id
    )));
  }

  let saved = state
    .store
    .sync_user(session, profile)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(saved))
}

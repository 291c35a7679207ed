//! Handlers for `/balances` endpoints.

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::{Datelike as _, Utc};
use leavebook_core::{UserId, ledger::LeaveBalance, store::LeaveStore};
use serde::Deserialize;

use crate::{ApiState, caller::Caller, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct BalanceParams {
  /// Whose ledger to read; the caller's own when absent.
  pub user_id: Option<UserId>,
  /// Defaults to the current calendar year.
  pub year:    Option<i32>,
}

fn current_year() -> i32 { Utc::now().year() }

/// `GET /balances?user_id=&year=`
pub async fn list<S: LeaveStore>(
  State(state): State<ApiState<S>>,
  Caller(session): Caller,
  Query(params): Query<BalanceParams>,
) -> Result<Json<Vec<LeaveBalance>>, ApiError> {
  let year = params.year.unwrap_or_else(current_year);
  let rows = state
    .store
    .balances(session, params.user_id, year)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct InitParams {
  pub year: Option<i32>,
}

/// `POST /balances/initialize?year=`
///
/// Creates the caller's missing ledger rows for `year` and returns all of
/// them. Safe to repeat.
pub async fn initialize<S: LeaveStore>(
  State(state): State<ApiState<S>>,
  Caller(session): Caller,
  Query(params): Query<InitParams>,
) -> Result<Json<Vec<LeaveBalance>>, ApiError> {
  let year = params.year.unwrap_or_else(current_year);
  let rows = state
    .store
    .balances(session, None, year)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(rows))
}

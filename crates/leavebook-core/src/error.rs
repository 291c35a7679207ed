//! Error taxonomy for `leavebook-core`.
//!
//! Eligibility failures carry structured detail so a client can render an
//! actionable message (an earliest start date, a day limit) instead of a
//! generic one. [`Error::code`] and [`Error::details`] expose that detail in
//! a transport-neutral shape.

use chrono::NaiveDate;
use serde_json::{Value, json};
use thiserror::Error;
use uuid::Uuid;

use crate::{CompanyId, LeaveTypeId, request::LeaveStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("invalid {field}: {message}")]
  Validation { field: &'static str, message: String },

  #[error("not eligible: {reason}")]
  NotEligible {
    reason:           String,
    min_service_days: Option<i64>,
  },

  #[error(
    "leave must be requested {notice_period_days} day(s) in advance; earliest possible start is {earliest_possible_date}"
  )]
  NoticePeriodViolation {
    notice_period_days:     i64,
    earliest_possible_date: NaiveDate,
  },

  #[error("{requested_days} working day(s) requested, at most {max_days} allowed")]
  MaxDaysExceeded { max_days: i64, requested_days: i64 },

  #[error("overlaps request {conflicting_request_id} ({start_date} to {end_date})")]
  OverlappingRequest {
    conflicting_request_id: Uuid,
    start_date:             NaiveDate,
    end_date:               NaiveDate,
  },

  #[error("leave type {leave_type_id} requires at least one supporting document")]
  DocumentationRequired { leave_type_id: LeaveTypeId },

  #[error("{requested_days} day(s) requested, only {available_days} available")]
  InsufficientBalance {
    available_days: i64,
    requested_days: i64,
  },

  #[error("cannot {action} request {request_id}: it is {current_status}")]
  InvalidStateTransition {
    request_id:     Uuid,
    current_status: LeaveStatus,
    action:         &'static str,
  },

  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: String },

  #[error("no active management user in company {company_id} to escalate to")]
  NoEscalationTargetFound { company_id: CompanyId },

  #[error("not permitted to {action}")]
  Forbidden { action: &'static str },

  #[error("persistence failure: {0}")]
  PersistenceFailure(String),
}

impl Error {
  pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
    Self::NotFound { entity, id: id.to_string() }
  }

  pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
    Self::Validation { field, message: message.into() }
  }

  /// Stable machine-readable identifier for the error kind.
  pub fn code(&self) -> &'static str {
    match self {
      Self::Validation { .. } => "validation_error",
      Self::NotEligible { .. } => "not_eligible",
      Self::NoticePeriodViolation { .. } => "notice_period_violation",
      Self::MaxDaysExceeded { .. } => "max_days_exceeded",
      Self::OverlappingRequest { .. } => "overlapping_request",
      Self::DocumentationRequired { .. } => "documentation_required",
      Self::InsufficientBalance { .. } => "insufficient_balance",
      Self::InvalidStateTransition { .. } => "invalid_state_transition",
      Self::NotFound { .. } => "not_found",
      Self::NoEscalationTargetFound { .. } => "no_escalation_target_found",
      Self::Forbidden { .. } => "forbidden",
      Self::PersistenceFailure(_) => "persistence_failure",
    }
  }

  /// Structured detail for client rendering. Empty object when the error
  /// carries nothing beyond its message.
  pub fn details(&self) -> Value {
    match self {
      Self::Validation { field, .. } => json!({ "field": field }),
      Self::NotEligible { min_service_days, .. } => match min_service_days {
        Some(days) => json!({ "min_service_days": days }),
        None => json!({}),
      },
      Self::NoticePeriodViolation {
        notice_period_days,
        earliest_possible_date,
      } => json!({
        "notice_period_days":     notice_period_days,
        "earliest_possible_date": earliest_possible_date,
      }),
      Self::MaxDaysExceeded { max_days, requested_days } => json!({
        "max_days":       max_days,
        "requested_days": requested_days,
      }),
      Self::OverlappingRequest {
        conflicting_request_id,
        start_date,
        end_date,
      } => json!({
        "conflicting_request_id": conflicting_request_id,
        "start_date":             start_date,
        "end_date":               end_date,
      }),
      Self::DocumentationRequired { leave_type_id } => {
        json!({ "leave_type_id": leave_type_id })
      }
      Self::InsufficientBalance { available_days, requested_days } => json!({
        "available_days": available_days,
        "requested_days": requested_days,
      }),
      Self::InvalidStateTransition { request_id, current_status, action } => {
        json!({
          "request_id":     request_id,
          "current_status": current_status,
          "action":         action,
        })
      }
      Self::NotFound { entity, id } => json!({ "entity": entity, "id": id }),
      Self::NoEscalationTargetFound { company_id } => {
        json!({ "company_id": company_id })
      }
      Self::Forbidden { action } => json!({ "action": action }),
      Self::PersistenceFailure(_) => json!({}),
    }
  }

  /// `true` for the failures produced by the eligibility validator.
  pub fn is_eligibility_failure(&self) -> bool {
    matches!(
      self,
      Self::Validation { .. }
        | Self::NotEligible { .. }
        | Self::NoticePeriodViolation { .. }
        | Self::MaxDaysExceeded { .. }
        | Self::DocumentationRequired { .. }
        | Self::InsufficientBalance { .. }
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

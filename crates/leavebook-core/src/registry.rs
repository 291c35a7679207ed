//! Leave type and policy registry types.
//!
//! A leave type with `company_id = None` is global and visible to every
//! tenant. Each type has at most one policy; a type without one behaves as if
//! it had [`LeavePolicy::fallback`].

use serde::{Deserialize, Serialize};

use crate::{CompanyId, Error, LeaveTypeId, Result, directory::Gender};

/// Upper bound for every day count a type or policy may carry.
pub const MAX_POLICY_DAYS: i64 = 3660;

fn check_days(field: &'static str, value: i64, min: i64) -> Result<()> {
  if value < min {
    let message = if min == 0 { "must not be negative" } else { "must be positive" };
    return Err(Error::validation(field, message));
  }
  if value > MAX_POLICY_DAYS {
    return Err(Error::validation(field, format!("must be at most {MAX_POLICY_DAYS}")));
  }
  Ok(())
}

// ─── Leave type ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveType {
  pub leave_type_id:          LeaveTypeId,
  pub company_id:             Option<CompanyId>,
  pub name:                   String,
  pub max_days:               i64,
  pub is_paid:                bool,
  pub requires_documentation: bool,
  pub is_active:              bool,
}

impl LeaveType {
  /// Active and either global or owned by `company_id`.
  pub fn visible_to(&self, company_id: CompanyId) -> bool {
    self.is_active && self.company_id.is_none_or(|c| c == company_id)
  }
}

/// Input for registering a leave type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLeaveType {
  #[serde(default)]
  pub company_id:             Option<CompanyId>,
  pub name:                   String,
  pub max_days:               i64,
  #[serde(default = "paid_by_default")]
  pub is_paid:                bool,
  #[serde(default)]
  pub requires_documentation: bool,
}

fn paid_by_default() -> bool { true }

impl NewLeaveType {
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::validation("name", "must not be blank"));
    }
    check_days("max_days", self.max_days, 1)
  }
}

// ─── Policy ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeavePolicy {
  pub leave_type_id:        LeaveTypeId,
  #[serde(default)]
  pub notice_period_days:   i64,
  /// Working-day cap per request; the type's `max_days` applies when unset.
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

impl LeavePolicy {
  /// The implicit policy of a leave type that has none on record.
  pub fn fallback(leave_type: &LeaveType) -> Self {
    Self {
      leave_type_id:        leave_type.leave_type_id,
      notice_period_days:   0,
      max_consecutive_days: None,
      min_service_days:     0,
      gender_specific:      None,
      default_days:         leave_type.max_days,
      carry_forward_days:   0,
    }
  }

  /// Longest request, in working days, this policy admits for `leave_type`.
  pub fn max_consecutive(&self, leave_type: &LeaveType) -> i64 {
    self.max_consecutive_days.unwrap_or(leave_type.max_days)
  }

  pub fn validate(&self) -> Result<()> {
    let counts = [
      ("notice_period_days", self.notice_period_days),
      ("min_service_days", self.min_service_days),
      ("default_days", self.default_days),
      ("carry_forward_days", self.carry_forward_days),
    ];
    for (field, value) in counts {
      check_days(field, value, 0)?;
    }
    if let Some(max) = self.max_consecutive_days {
      check_days("max_consecutive_days", max, 1)?;
    }
    Ok(())
  }
}

/// A leave type together with its policy, as listed to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveTypeEntry {
  #[serde(flatten)]
  pub leave_type: LeaveType,
  pub policy:     Option<LeavePolicy>,
}

//! Balance ledger arithmetic.
//!
//! A ledger row is keyed by (user, leave type, year). Every mutation here
//! preserves `used + pending <= total + carry_forward`; the SQLite schema
//! carries the same rule as a `CHECK` constraint.

use serde::{Deserialize, Serialize};

use crate::{
  Error, LeaveTypeId, Result, UserId,
  registry::{LeavePolicy, LeaveType},
};

/// How a lifecycle transition moves days through the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerEffect {
  /// `pending += days`
  Reserve,
  /// `used += days; pending -= days`
  Commit,
  /// `pending -= days`
  Release,
  /// The reservation stays as it is.
  Hold,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveBalance {
  pub user_id:            UserId,
  pub leave_type_id:      LeaveTypeId,
  pub year:               i32,
  pub total_days:         i64,
  pub used_days:          i64,
  pub pending_days:       i64,
  pub carry_forward_days: i64,
}

impl LeaveBalance {
  /// The row created on first access to `year`.
  ///
  /// Entitlement comes from the policy's default allocation. Carry-forward is
  /// whatever was left over in `previous` (the same type, `year - 1`), capped
  /// by the policy's carry-forward limit.
  pub fn opening(
    user_id: UserId,
    leave_type: &LeaveType,
    policy: Option<&LeavePolicy>,
    year: i32,
    previous: Option<&LeaveBalance>,
  ) -> Self {
    let policy = policy
      .cloned()
      .unwrap_or_else(|| LeavePolicy::fallback(leave_type));
    let carry_forward_days = previous
      .map(|p| p.available_days().min(policy.carry_forward_days).max(0))
      .unwrap_or(0);

    Self {
      user_id,
      leave_type_id: leave_type.leave_type_id,
      year,
      total_days: policy.default_days,
      used_days: 0,
      pending_days: 0,
      carry_forward_days,
    }
  }

  pub fn available_days(&self) -> i64 {
    self.total_days + self.carry_forward_days - self.used_days - self.pending_days
  }

  pub fn reserve(&mut self, days: i64) -> Result<()> {
    check_days(days)?;
    let available = self.available_days();
    if available < days {
      return Err(Error::InsufficientBalance {
        available_days: available,
        requested_days: days,
      });
    }
    self.pending_days += days;
    Ok(())
  }

  pub fn commit(&mut self, days: i64) -> Result<()> {
    check_days(days)?;
    self.check_pending(days)?;
    self.pending_days -= days;
    self.used_days += days;
    Ok(())
  }

  pub fn release(&mut self, days: i64) -> Result<()> {
    check_days(days)?;
    self.check_pending(days)?;
    self.pending_days -= days;
    Ok(())
  }

  pub fn apply(&mut self, effect: LedgerEffect, days: i64) -> Result<()> {
    match effect {
      LedgerEffect::Reserve => self.reserve(days),
      LedgerEffect::Commit => self.commit(days),
      LedgerEffect::Release => self.release(days),
      LedgerEffect::Hold => Ok(()),
    }
  }

  fn check_pending(&self, days: i64) -> Result<()> {
    if self.pending_days < days {
      return Err(Error::PersistenceFailure(format!(
        "ledger for user {} type {} year {} has {} pending day(s), cannot settle {}",
        self.user_id, self.leave_type_id, self.year, self.pending_days, days
      )));
    }
    Ok(())
  }
}

fn check_days(days: i64) -> Result<()> {
  if days < 0 {
    return Err(Error::validation("days", "must not be negative"));
  }
  Ok(())
}

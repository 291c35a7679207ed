//! Escalation records and reviewer selection.
//!
//! An escalation hands a pending request from its group admin to a
//! management reviewer in the same company. At most one escalation per
//! request is open at a time (enforced by a partial unique index).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  CompanyId, Error, Result, UserId,
  directory::{Role, UserProfile},
  request::{LeaveRequest, LeaveStatus},
};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EscalationStatus {
  Pending,
  Resolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveEscalation {
  pub escalation_id:    Uuid,
  pub request_id:       Uuid,
  pub escalated_by:     UserId,
  pub escalated_to:     UserId,
  pub reason:           String,
  pub status:           EscalationStatus,
  pub resolution_notes: Option<String>,
  pub created_at:       DateTime<Utc>,
  pub resolved_at:      Option<DateTime<Utc>>,
}

impl LeaveEscalation {
  pub fn open(
    request_id: Uuid,
    escalated_by: UserId,
    escalated_to: UserId,
    reason: String,
    at: DateTime<Utc>,
  ) -> Self {
    Self {
      escalation_id: Uuid::new_v4(),
      request_id,
      escalated_by,
      escalated_to,
      reason,
      status: EscalationStatus::Pending,
      resolution_notes: None,
      created_at: at,
      resolved_at: None,
    }
  }

  pub fn close(&mut self, notes: String, at: DateTime<Utc>) {
    self.status = EscalationStatus::Resolved;
    self.resolution_notes = Some(notes);
    self.resolved_at = Some(at);
  }
}

/// Pick the reviewer for an escalation in `company_id`: the active
/// management user with the lowest id. Candidates may arrive in any order.
pub fn select_target<'a>(
  candidates: impl IntoIterator<Item = &'a UserProfile>,
  company_id: CompanyId,
) -> Option<&'a UserProfile> {
  candidates
    .into_iter()
    .filter(|u| u.is_active && u.role == Role::Management && u.company_id == company_id)
    .min_by_key(|u| u.user_id)
}

// ─── Sweep ───────────────────────────────────────────────────────────────────

/// Settings for the optional sweep that escalates requests left undecided.
#[derive(Debug, Clone, Copy)]
pub struct SweepPolicy {
  pub older_than: Duration,
}

impl SweepPolicy {
  /// Fails when `hours` does not fit a [`Duration`].
  pub fn from_hours(hours: u64) -> Result<Self> {
    i64::try_from(hours)
      .ok()
      .and_then(Duration::try_hours)
      .map(|older_than| Self { older_than })
      .ok_or_else(|| Error::validation("auto_escalate_after_hours", "out of range"))
  }

  /// Requests created at or before this instant are overdue at `now`.
  pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_signed(self.older_than).unwrap_or(DateTime::<Utc>::MIN_UTC)
  }

  pub fn is_overdue(&self, request: &LeaveRequest, now: DateTime<Utc>) -> bool {
    request.status == LeaveStatus::Pending
      && request.group_admin_id.is_some()
      && request.created_at <= self.cutoff(now)
  }

  pub fn reason(&self) -> String {
    format!(
      "auto-escalated after {} hours without a decision",
      self.older_than.num_hours()
    )
  }
}

//! The request lifecycle state machine.
//!
//! ```text
//! pending ──approve──▶ approved
//!    │ ────reject───▶ rejected
//!    └────escalate──▶ escalated ──resolve(approve)──▶ approved
//!                                └─resolve(reject)───▶ rejected
//! ```
//!
//! [`plan`] is pure: it decides whether a transition is legal from the
//! status a store has just read, and what ledger effect it carries. The store
//! then applies the plan under a guard on that same status.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, ledger::LedgerEffect, request::LeaveStatus};

// ─── Actions ─────────────────────────────────────────────────────────────────

/// What a reviewer may do to a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
  Approve,
  Reject,
  Escalate,
}

/// The decision that closes an escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalAction {
  Approve,
  Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
  Approve,
  Reject,
  Escalate,
  Resolve(FinalAction),
}

impl From<ReviewAction> for Transition {
  fn from(action: ReviewAction) -> Self {
    match action {
      ReviewAction::Approve => Self::Approve,
      ReviewAction::Reject => Self::Reject,
      ReviewAction::Escalate => Self::Escalate,
    }
  }
}

impl Transition {
  pub fn name(self) -> &'static str {
    match self {
      Self::Approve => "approve",
      Self::Reject => "reject",
      Self::Escalate => "escalate",
      Self::Resolve(_) => "resolve",
    }
  }

  /// The only status this transition may start from.
  pub fn source(self) -> LeaveStatus {
    match self {
      Self::Approve | Self::Reject | Self::Escalate => LeaveStatus::Pending,
      Self::Resolve(_) => LeaveStatus::Escalated,
    }
  }

  pub fn target(self) -> LeaveStatus {
    match self {
      Self::Approve | Self::Resolve(FinalAction::Approve) => LeaveStatus::Approved,
      Self::Reject | Self::Resolve(FinalAction::Reject) => LeaveStatus::Rejected,
      Self::Escalate => LeaveStatus::Escalated,
    }
  }

  pub fn ledger_effect(self) -> LedgerEffect {
    match self.target() {
      LeaveStatus::Approved => LedgerEffect::Commit,
      LeaveStatus::Rejected => LedgerEffect::Release,
      LeaveStatus::Escalated | LeaveStatus::Pending => LedgerEffect::Hold,
    }
  }
}

// ─── Planning ────────────────────────────────────────────────────────────────

/// A legal transition, ready to be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPlan {
  pub transition: Transition,
  pub from:       LeaveStatus,
  pub to:         LeaveStatus,
  pub effect:     LedgerEffect,
}

/// Check `transition` against the request's `current` status.
pub fn plan(
  request_id: Uuid,
  current: LeaveStatus,
  transition: Transition,
) -> Result<TransitionPlan> {
  if current != transition.source() {
    return Err(stale(request_id, current, transition));
  }
  Ok(TransitionPlan {
    transition,
    from: current,
    to: transition.target(),
    effect: transition.ledger_effect(),
  })
}

/// The error reported when a request is no longer in the status a
/// transition expects.
pub fn stale(request_id: Uuid, current: LeaveStatus, transition: Transition) -> Error {
  Error::InvalidStateTransition {
    request_id,
    current_status: current,
    action: transition.name(),
  }
}

//! Outbound lifecycle events.
//!
//! Delivery is fire-and-forget: events are emitted only after the transition
//! has committed, and a notifier cannot fail the operation that produced it.

use serde::Serialize;
use uuid::Uuid;

use crate::{
  UserId,
  lifecycle::FinalAction,
  request::{LeaveRequest, LeaveStatus},
  store::Decision,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LeaveEvent {
  Submitted {
    request_id:     Uuid,
    user_id:        UserId,
    group_admin_id: Option<UserId>,
    days:           i64,
  },
  Approved { request_id: Uuid, user_id: UserId, days: i64 },
  Rejected {
    request_id: Uuid,
    user_id:    UserId,
    reason:     Option<String>,
  },
  Escalated {
    request_id:   Uuid,
    escalated_by: UserId,
    escalated_to: UserId,
  },
  Resolved {
    request_id:   Uuid,
    resolved_by:  UserId,
    final_action: FinalAction,
  },
}

impl LeaveEvent {
  pub fn submitted(request: &LeaveRequest) -> Self {
    Self::Submitted {
      request_id:     request.request_id,
      user_id:        request.user_id,
      group_admin_id: request.group_admin_id,
      days:           request.days_requested,
    }
  }

  /// Events describing a committed decision, in the order they happened.
  pub fn from_decision(decision: &Decision) -> Vec<Self> {
    let request = &decision.request;
    let mut events = Vec::with_capacity(2);

    if let Some(esc) = &decision.escalation {
      if esc.resolved_at.is_some() {
        let final_action = if request.status == LeaveStatus::Approved {
          FinalAction::Approve
        } else {
          FinalAction::Reject
        };
        events.push(Self::Resolved {
          request_id: request.request_id,
          resolved_by: esc.escalated_to,
          final_action,
        });
      } else {
        events.push(Self::Escalated {
          request_id:   request.request_id,
          escalated_by: esc.escalated_by,
          escalated_to: esc.escalated_to,
        });
      }
    }

    match request.status {
      LeaveStatus::Approved => events.push(Self::Approved {
        request_id: request.request_id,
        user_id:    request.user_id,
        days:       request.days_requested,
      }),
      LeaveStatus::Rejected => events.push(Self::Rejected {
        request_id: request.request_id,
        user_id:    request.user_id,
        reason:     request.rejection_reason.clone(),
      }),
      LeaveStatus::Pending | LeaveStatus::Escalated => {}
    }

    events
  }
}

/// Receiver of lifecycle events.
pub trait Notifier: Send + Sync {
  fn notify(&self, event: LeaveEvent);
}

/// Writes every event to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
  fn notify(&self, event: LeaveEvent) {
    match serde_json::to_string(&event) {
      Ok(payload) => tracing::info!(target: "leavebook::events", %payload, "leave event"),
      Err(e) => tracing::warn!(error = %e, "failed to encode leave event"),
    }
  }
}

//! The `LeaveStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `leavebook-store-sqlite`). Higher layers (`leavebook-api`,
//! `leavebook-server`) depend on this abstraction, not on any concrete
//! backend.
//!
//! Every mutating method is one atomic unit: the backend loads the resource,
//! asks [`authorize`](crate::authz::authorize), evaluates the pure rules in
//! this crate, and writes request, document, ledger and escalation rows
//! together or not at all.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  UserId,
  directory::{Session, UserProfile},
  escalation::{LeaveEscalation, SweepPolicy},
  ledger::LeaveBalance,
  lifecycle::{FinalAction, ReviewAction},
  registry::{LeavePolicy, LeaveType, LeaveTypeEntry, NewLeaveType},
  request::{DraftRequest, LeaveRequest, RequestView},
};

/// The result of a lifecycle transition.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Decision {
  pub request:    LeaveRequest,
  /// The escalation opened or closed by this transition, if any.
  pub escalation: Option<LeaveEscalation>,
}

/// Abstraction over a Leavebook storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait LeaveStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  // ── Directory ─────────────────────────────────────────────────────────

  /// Insert or replace a directory entry on behalf of `session`.
  ///
  /// The caller must manage both the company the profile names and, for an
  /// existing user, the company the user currently belongs to.
  fn sync_user(
    &self,
    session: Session,
    profile: UserProfile,
  ) -> impl Future<Output = Result<UserProfile, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Option<UserProfile>, Self::Error>> + Send + '_;

  // ── Registry ──────────────────────────────────────────────────────────

  /// Register a leave type owned by the caller's company.
  fn create_leave_type(
    &self,
    session: Session,
    input: NewLeaveType,
  ) -> impl Future<Output = Result<LeaveType, Self::Error>> + Send + '_;

  /// Create or replace the policy of a leave type.
  fn set_policy(
    &self,
    session: Session,
    policy: LeavePolicy,
  ) -> impl Future<Output = Result<LeavePolicy, Self::Error>> + Send + '_;

  /// Active leave types visible to the caller's company, with policies.
  fn list_leave_types(
    &self,
    session: Session,
  ) -> impl Future<Output = Result<Vec<LeaveTypeEntry>, Self::Error>> + Send + '_;

  // ── Ledger ────────────────────────────────────────────────────────────

  /// Ledger rows of `user_id` (the caller when `None`) for `year`, creating
  /// any that are missing. Idempotent.
  fn balances(
    &self,
    session: Session,
    user_id: Option<UserId>,
    year: i32,
  ) -> impl Future<Output = Result<Vec<LeaveBalance>, Self::Error>> + Send + '_;

  // ── Lifecycle ─────────────────────────────────────────────────────────

  /// Validate `draft` and persist it as a pending request, reserving its
  /// working days.
  fn submit(
    &self,
    session: Session,
    draft: DraftRequest,
    today: NaiveDate,
  ) -> impl Future<Output = Result<LeaveRequest, Self::Error>> + Send + '_;

  /// Approve, reject or escalate a pending request.
  fn process(
    &self,
    session: Session,
    request_id: Uuid,
    action: ReviewAction,
    reason: Option<String>,
  ) -> impl Future<Output = Result<Decision, Self::Error>> + Send + '_;

  /// Close the open escalation of a request with a final decision.
  fn resolve_escalation(
    &self,
    session: Session,
    request_id: Uuid,
    resolution_notes: String,
    final_action: FinalAction,
  ) -> impl Future<Output = Result<Decision, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// The caller's own requests, newest first.
  fn list_mine(
    &self,
    session: Session,
  ) -> impl Future<Output = Result<Vec<RequestView>, Self::Error>> + Send + '_;

  /// Requests awaiting the caller's decision.
  ///
  /// Group admins see pending requests of their direct reports. Management
  /// sees pending requests of group admins (and of unassigned users) in
  /// their company, plus escalations addressed to them.
  fn list_pending_for_review(
    &self,
    session: Session,
  ) -> impl Future<Output = Result<Vec<RequestView>, Self::Error>> + Send + '_;

  // ── Sweep ─────────────────────────────────────────────────────────────

  /// Pending requests with a group admin that were created at or before
  /// `cutoff`.
  fn overdue_pending(
    &self,
    cutoff: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<LeaveRequest>, Self::Error>> + Send + '_;

  /// Escalate on behalf of the system, recording the request's group admin
  /// as the escalating user.
  fn auto_escalate(
    &self,
    request_id: Uuid,
    sweep: SweepPolicy,
  ) -> impl Future<Output = Result<Decision, Self::Error>> + Send + '_;
}

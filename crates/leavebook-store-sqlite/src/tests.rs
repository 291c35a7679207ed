//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, NaiveDate, Utc};
use leavebook_core::{
  Error as CoreError,
  directory::{Gender, Role, Session, UserProfile},
  escalation::{EscalationStatus, SweepPolicy},
  ledger::LeaveBalance,
  lifecycle::{FinalAction, ReviewAction},
  registry::{LeavePolicy, NewLeaveType},
  request::{DraftRequest, LeaveStatus, NewDocument},
  store::LeaveStore,
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

// ─── Fixture ─────────────────────────────────────────────────────────────────

const MANAGER: i64 = 1;
const ADMIN: i64 = 2;
const ALICE: i64 = 10;
const BOB: i64 = 11;
const OTHER_MANAGER: i64 = 50;

fn d(y: i32, m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, day).unwrap() }

/// A Monday.
fn today() -> NaiveDate { d(2024, 5, 20) }

fn user(
  user_id: i64,
  company_id: i64,
  role: Role,
  group_admin_id: Option<i64>,
) -> UserProfile {
  UserProfile {
    user_id,
    company_id,
    role,
    gender: Some(Gender::Female),
    group_admin_id,
    joined_on: Some(d(2020, 1, 6)),
    is_active: true,
  }
}

struct Fixture {
  store:  SqliteStore,
  annual: i64,
  sick:   i64,
}

impl Fixture {
  fn session(&self, user_id: i64) -> Session {
    match user_id {
      MANAGER => user(MANAGER, 1, Role::Management, None).session(),
      ADMIN => user(ADMIN, 1, Role::GroupAdmin, None).session(),
      OTHER_MANAGER => user(OTHER_MANAGER, 2, Role::Management, None).session(),
      id => user(id, 1, Role::Employee, Some(ADMIN)).session(),
    }
  }

  fn draft(&self, leave_type_id: i64, start: NaiveDate, end: NaiveDate) -> DraftRequest {
    DraftRequest {
      leave_type_id,
      start_date: start,
      end_date: end,
      reason: "family trip".into(),
      contact_number: "555-0100".into(),
      documents: vec![],
    }
  }

  async fn submit(&self, user_id: i64, start: NaiveDate, end: NaiveDate) -> Uuid {
    self
      .store
      .submit(self.session(user_id), self.draft(self.annual, start, end), today())
      .await
      .unwrap()
      .request_id
  }

  async fn decide(
    &self,
    reviewer: i64,
    request_id: Uuid,
    action: ReviewAction,
  ) -> Result<LeaveStatus, Error> {
    let reason = Some("noted".to_owned());
    self
      .store
      .process(self.session(reviewer), request_id, action, reason)
      .await
      .map(|decision| decision.request.status)
  }

  async fn annual_balance(&self, user_id: i64, year: i32) -> LeaveBalance {
    self
      .store
      .balances(self.session(user_id), None, year)
      .await
      .unwrap()
      .into_iter()
      .find(|b| b.leave_type_id == self.annual)
      .unwrap()
  }
}

/// Company 1: one manager, one group admin, two employees reporting to the
/// admin. Company 2: one manager. Annual leave has a policy (notice 3,
/// at most 10 consecutive days, 12 per year, carry-forward 5); sick leave
/// needs documents and has no policy.
async fn fixture() -> Fixture {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  for profile in [
    user(MANAGER, 1, Role::Management, None),
    user(ADMIN, 1, Role::GroupAdmin, None),
    user(ALICE, 1, Role::Employee, Some(ADMIN)),
    user(BOB, 1, Role::Employee, Some(ADMIN)),
    user(OTHER_MANAGER, 2, Role::Management, None),
  ] {
    store.upsert_user(profile).await.unwrap();
  }

  let manager = user(MANAGER, 1, Role::Management, None).session();
  let annual = store
    .create_leave_type(manager, NewLeaveType {
      company_id:             None,
      name:                   "Annual".into(),
      max_days:               15,
      is_paid:                true,
      requires_documentation: false,
    })
    .await
    .unwrap();
  store
    .set_policy(manager, LeavePolicy {
      leave_type_id:        annual.leave_type_id,
      notice_period_days:   3,
      max_consecutive_days: Some(10),
      min_service_days:     0,
      gender_specific:      None,
      default_days:         12,
      carry_forward_days:   5,
    })
    .await
    .unwrap();
  let sick = store
    .create_leave_type(manager, NewLeaveType {
      company_id:             None,
      name:                   "Sick".into(),
      max_days:               10,
      is_paid:                true,
      requires_documentation: true,
    })
    .await
    .unwrap();

  Fixture {
    store,
    annual: annual.leave_type_id,
    sick: sick.leave_type_id,
  }
}

fn core(err: Error) -> CoreError { err.into() }

// ─── Registry ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn leave_types_are_company_scoped() {
  let f = fixture().await;

  let mine = f.store.list_leave_types(f.session(ALICE)).await.unwrap();
  assert_eq!(mine.len(), 2);
  assert_eq!(mine[0].policy.as_ref().map(|p| p.default_days), Some(12));
  assert!(mine[1].policy.is_none());

  let theirs = f.store.list_leave_types(f.session(OTHER_MANAGER)).await.unwrap();
  assert!(theirs.is_empty());

  let global = f
    .store
    .ensure_global_leave_type(NewLeaveType {
      company_id:             None,
      name:                   "Unpaid".into(),
      max_days:               20,
      is_paid:                false,
      requires_documentation: false,
    })
    .await
    .unwrap();
  assert_eq!(global.company_id, None);
  let theirs = f.store.list_leave_types(f.session(OTHER_MANAGER)).await.unwrap();
  assert_eq!(theirs.len(), 1);
}

#[tokio::test]
async fn global_type_seeding_is_idempotent() {
  let f = fixture().await;
  let input = NewLeaveType {
    company_id:             None,
    name:                   "Unpaid".into(),
    max_days:               20,
    is_paid:                false,
    requires_documentation: false,
  };
  let first = f.store.ensure_global_leave_type(input.clone()).await.unwrap();
  let second = f.store.ensure_global_leave_type(input).await.unwrap();
  assert_eq!(first.leave_type_id, second.leave_type_id);
}

#[tokio::test]
async fn registry_changes_require_owning_management() {
  let f = fixture().await;
  let new_type = NewLeaveType {
    company_id:             None,
    name:                   "Study".into(),
    max_days:               5,
    is_paid:                true,
    requires_documentation: false,
  };

  let err = f.store.create_leave_type(f.session(ALICE), new_type.clone()).await.unwrap_err();
  assert!(matches!(core(err), CoreError::Forbidden { .. }));

  let foreign = NewLeaveType { company_id: Some(2), ..new_type };
  let err = f.store.create_leave_type(f.session(MANAGER), foreign).await.unwrap_err();
  assert!(matches!(core(err), CoreError::Forbidden { .. }));

  // Another company's type is invisible, not forbidden.
  let types = f.store.list_leave_types(f.session(MANAGER)).await.unwrap();
  let policy = LeavePolicy::fallback(&types[0].leave_type);
  let err = f.store.set_policy(f.session(OTHER_MANAGER), policy).await.unwrap_err();
  assert!(matches!(core(err), CoreError::NotFound { entity: "leave type", .. }));
}

#[tokio::test]
async fn out_of_range_policy_is_rejected() {
  let f = fixture().await;
  let policy = LeavePolicy {
    leave_type_id:        f.annual,
    notice_period_days:   100_000_000,
    max_consecutive_days: Some(10),
    min_service_days:     0,
    gender_specific:      None,
    default_days:         12,
    carry_forward_days:   5,
  };
  let err = f.store.set_policy(f.session(MANAGER), policy).await.unwrap_err();
  assert!(matches!(core(err), CoreError::Validation { field: "notice_period_days", .. }));

  // The old policy still applies and the store keeps serving.
  f.submit(ALICE, d(2024, 6, 3), d(2024, 6, 4)).await;
  let types = f.store.list_leave_types(f.session(ALICE)).await.unwrap();
  assert_eq!(types[0].policy.as_ref().map(|p| p.notice_period_days), Some(3));
}

// ─── Directory ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn directory_sync_stays_within_the_company() {
  let f = fixture().await;

  let newcomer = user(12, 1, Role::Employee, Some(ADMIN));
  let saved = f.store.sync_user(f.session(MANAGER), newcomer.clone()).await.unwrap();
  assert_eq!(saved, newcomer);

  let err = f.store.sync_user(f.session(ALICE), newcomer).await.unwrap_err();
  assert!(matches!(core(err), CoreError::Forbidden { action: "manage users" }));

  // Neither side may move Alice from company 1 to company 2.
  let moved = user(ALICE, 2, Role::Employee, None);
  let err = f.store.sync_user(f.session(OTHER_MANAGER), moved.clone()).await.unwrap_err();
  assert!(matches!(core(err), CoreError::Forbidden { .. }));
  let err = f.store.sync_user(f.session(MANAGER), moved).await.unwrap_err();
  assert!(matches!(core(err), CoreError::Forbidden { .. }));
  let alice = f.store.get_user(ALICE).await.unwrap().unwrap();
  assert_eq!(alice.company_id, 1);

  let reassigned = user(ALICE, 1, Role::Employee, None);
  f.store.sync_user(f.session(MANAGER), reassigned).await.unwrap();
  let alice = f.store.get_user(ALICE).await.unwrap().unwrap();
  assert_eq!(alice.group_admin_id, None);
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn balance_initialisation_is_idempotent() {
  let f = fixture().await;
  let first = f.store.balances(f.session(ALICE), None, 2024).await.unwrap();
  let second = f.store.balances(f.session(ALICE), None, 2024).await.unwrap();

  assert_eq!(first, second);
  assert_eq!(first.len(), 2);
  let sick = first.iter().find(|b| b.leave_type_id == f.sick).unwrap();
  // No policy: entitlement falls back to the type's max_days.
  assert_eq!((sick.total_days, sick.carry_forward_days), (10, 0));
}

#[tokio::test]
async fn carry_forward_takes_leftover_up_to_cap() {
  let f = fixture().await;
  let manager = f.session(MANAGER);
  f.store
    .set_policy(manager, LeavePolicy {
      leave_type_id:        f.annual,
      notice_period_days:   3,
      max_consecutive_days: Some(10),
      min_service_days:     0,
      gender_specific:      None,
      default_days:         12,
      carry_forward_days:   10,
    })
    .await
    .unwrap();

  // Five days used in 2023 leaves seven over, under the cap of ten.
  let request_id = f
    .store
    .submit(
      f.session(ALICE),
      f.draft(f.annual, d(2023, 6, 5), d(2023, 6, 9)),
      d(2023, 5, 22),
    )
    .await
    .unwrap()
    .request_id;
  f.decide(ADMIN, request_id, ReviewAction::Approve).await.unwrap();

  let b2024 = f.annual_balance(ALICE, 2024).await;
  assert_eq!(b2024.carry_forward_days, 7);
  assert_eq!(b2024.available_days(), 19);

  // Bob used nothing in 2023 but only gets the cap.
  f.annual_balance(BOB, 2023).await;
  f.store
    .set_policy(manager, LeavePolicy {
      leave_type_id:        f.annual,
      notice_period_days:   3,
      max_consecutive_days: Some(10),
      min_service_days:     0,
      gender_specific:      None,
      default_days:         12,
      carry_forward_days:   5,
    })
    .await
    .unwrap();
  assert_eq!(f.annual_balance(BOB, 2024).await.carry_forward_days, 5);
}

#[tokio::test]
async fn balances_visible_to_owner_admin_and_management_only() {
  let f = fixture().await;
  assert!(f.store.balances(f.session(ADMIN), Some(ALICE), 2024).await.is_ok());
  assert!(f.store.balances(f.session(MANAGER), Some(ALICE), 2024).await.is_ok());

  let err = f.store.balances(f.session(BOB), Some(ALICE), 2024).await.unwrap_err();
  assert!(matches!(core(err), CoreError::Forbidden { .. }));
  let err = f.store.balances(f.session(OTHER_MANAGER), Some(ALICE), 2024).await.unwrap_err();
  assert!(matches!(core(err), CoreError::Forbidden { .. }));
  let err = f.store.balances(f.session(MANAGER), Some(999), 2024).await.unwrap_err();
  assert!(matches!(core(err), CoreError::NotFound { entity: "user", .. }));
}

// ─── Submission ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn submit_then_approve_moves_days_from_pending_to_used() {
  let f = fixture().await;

  // Two days already taken: 12 total, 2 used.
  let earlier = f.submit(ALICE, d(2024, 6, 3), d(2024, 6, 4)).await;
  f.decide(ADMIN, earlier, ReviewAction::Approve).await.unwrap();
  let before = f.annual_balance(ALICE, 2024).await;
  assert_eq!((before.total_days, before.used_days, before.pending_days), (12, 2, 0));

  let request_id = f.submit(ALICE, d(2024, 6, 10), d(2024, 6, 14)).await;
  let reserved = f.annual_balance(ALICE, 2024).await;
  assert_eq!((reserved.used_days, reserved.pending_days), (2, 5));
  assert_eq!(reserved.available_days(), 5);

  let status = f.decide(ADMIN, request_id, ReviewAction::Approve).await.unwrap();
  assert_eq!(status, LeaveStatus::Approved);
  let after = f.annual_balance(ALICE, 2024).await;
  assert_eq!((after.used_days, after.pending_days), (7, 0));
  assert_eq!(after.available_days(), 5);
}

#[tokio::test]
async fn submit_then_reject_restores_balance() {
  let f = fixture().await;
  let before = f.annual_balance(ALICE, 2024).await;

  let request_id = f.submit(ALICE, d(2024, 6, 10), d(2024, 6, 12)).await;
  assert_eq!(f.annual_balance(ALICE, 2024).await.pending_days, 3);

  let err = f
    .store
    .process(f.session(ADMIN), request_id, ReviewAction::Reject, None)
    .await
    .unwrap_err();
  assert!(matches!(core(err), CoreError::Validation { field: "reason", .. }));

  let decision = f
    .store
    .process(
      f.session(ADMIN),
      request_id,
      ReviewAction::Reject,
      Some("team offsite".into()),
    )
    .await
    .unwrap();
  assert_eq!(decision.request.status, LeaveStatus::Rejected);
  assert_eq!(decision.request.rejection_reason.as_deref(), Some("team offsite"));
  assert_eq!(f.annual_balance(ALICE, 2024).await, before);
}

#[tokio::test]
async fn missing_documents_leave_the_ledger_untouched() {
  let f = fixture().await;
  let draft = f.draft(f.sick, d(2024, 5, 21), d(2024, 5, 22));

  let err = f.store.submit(f.session(ALICE), draft.clone(), today()).await.unwrap_err();
  assert_eq!(core(err), CoreError::DocumentationRequired { leave_type_id: f.sick });

  let balances = f.store.balances(f.session(ALICE), None, 2024).await.unwrap();
  assert!(balances.iter().all(|b| b.pending_days == 0 && b.used_days == 0));
  assert!(f.store.list_mine(f.session(ALICE)).await.unwrap().is_empty());

  let with_note = DraftRequest {
    documents: vec![NewDocument {
      file_name:     "note.pdf".into(),
      file_type:     "application/pdf".into(),
      file_data:     b"%PDF-1.4".to_vec(),
      upload_method: "file".into(),
    }],
    ..draft
  };
  f.store.submit(f.session(ALICE), with_note, today()).await.unwrap();

  let mine = f.store.list_mine(f.session(ALICE)).await.unwrap();
  assert_eq!(mine.len(), 1);
  assert_eq!(mine[0].documents[0].file_data, b"%PDF-1.4");
  assert_eq!(mine[0].balance.as_ref().map(|b| b.pending_days), Some(2));
}

#[tokio::test]
async fn overlapping_request_is_refused() {
  let f = fixture().await;
  let first = f.submit(ALICE, d(2024, 6, 1), d(2024, 6, 5)).await;

  let err = f
    .store
    .submit(f.session(ALICE), f.draft(f.annual, d(2024, 6, 3), d(2024, 6, 10)), today())
    .await
    .unwrap_err();
  assert_eq!(core(err), CoreError::OverlappingRequest {
    conflicting_request_id: first,
    start_date:             d(2024, 6, 1),
    end_date:               d(2024, 6, 5),
  });

  // Another employee is unaffected.
  f.submit(BOB, d(2024, 6, 3), d(2024, 6, 10)).await;
}

#[tokio::test]
async fn notice_period_reports_earliest_start() {
  let f = fixture().await;
  let err = f
    .store
    .submit(f.session(ALICE), f.draft(f.annual, d(2024, 5, 21), d(2024, 5, 21)), today())
    .await
    .unwrap_err();
  assert_eq!(core(err), CoreError::NoticePeriodViolation {
    notice_period_days:     3,
    earliest_possible_date: d(2024, 5, 23),
  });
}

#[tokio::test]
async fn open_ended_range_exceeds_the_limit() {
  let f = fixture().await;
  let err = f
    .store
    .submit(f.session(ALICE), f.draft(f.annual, d(2024, 6, 3), NaiveDate::MAX), today())
    .await
    .unwrap_err();
  assert!(matches!(
    core(err),
    CoreError::MaxDaysExceeded { max_days: 10, requested_days } if requested_days > 60_000_000
  ));
  f.submit(ALICE, d(2024, 6, 3), d(2024, 6, 4)).await;
}

#[tokio::test]
async fn insufficient_balance_reports_availability() {
  let f = fixture().await;
  f.submit(ALICE, d(2024, 6, 3), d(2024, 6, 14)).await;

  let err = f
    .store
    .submit(f.session(ALICE), f.draft(f.annual, d(2024, 7, 1), d(2024, 7, 5)), today())
    .await
    .unwrap_err();
  assert_eq!(core(err), CoreError::InsufficientBalance {
    available_days: 2,
    requested_days: 5,
  });
}

#[tokio::test]
async fn minimum_service_is_enforced() {
  let f = fixture().await;
  f.store
    .upsert_user(UserProfile {
      joined_on: Some(d(2024, 5, 1)),
      ..user(BOB, 1, Role::Employee, Some(ADMIN))
    })
    .await
    .unwrap();
  f.store
    .set_policy(f.session(MANAGER), LeavePolicy {
      leave_type_id:        f.annual,
      notice_period_days:   3,
      max_consecutive_days: Some(10),
      min_service_days:     90,
      gender_specific:      None,
      default_days:         12,
      carry_forward_days:   5,
    })
    .await
    .unwrap();

  let err = f
    .store
    .submit(f.session(BOB), f.draft(f.annual, d(2024, 6, 3), d(2024, 6, 4)), today())
    .await
    .unwrap_err();
  assert!(matches!(core(err), CoreError::NotEligible { min_service_days: Some(90), .. }));
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn escalate_then_resolve_approve() {
  let f = fixture().await;
  let request_id = f.submit(ALICE, d(2024, 6, 10), d(2024, 6, 14)).await;

  let err = f
    .store
    .process(f.session(ADMIN), request_id, ReviewAction::Escalate, Some("  ".into()))
    .await
    .unwrap_err();
  assert!(matches!(core(err), CoreError::Validation { field: "reason", .. }));

  let decision = f
    .store
    .process(
      f.session(ADMIN),
      request_id,
      ReviewAction::Escalate,
      Some("overlaps quarter close".into()),
    )
    .await
    .unwrap();
  assert_eq!(decision.request.status, LeaveStatus::Escalated);
  let escalation = decision.escalation.unwrap();
  assert_eq!((escalation.escalated_by, escalation.escalated_to), (ADMIN, MANAGER));
  assert_eq!(f.annual_balance(ALICE, 2024).await.pending_days, 5);

  let queue = f.store.list_pending_for_review(f.session(MANAGER)).await.unwrap();
  assert_eq!(queue.len(), 1);
  assert_eq!(queue[0].request.request_id, request_id);
  assert!(f.store.list_pending_for_review(f.session(ADMIN)).await.unwrap().is_empty());

  // Only the addressee may resolve.
  let err = f
    .store
    .resolve_escalation(f.session(ADMIN), request_id, "ok".into(), FinalAction::Approve)
    .await
    .unwrap_err();
  assert!(matches!(core(err), CoreError::Forbidden { .. }));

  let decision = f
    .store
    .resolve_escalation(
      f.session(MANAGER),
      request_id,
      "covered by Bob".into(),
      FinalAction::Approve,
    )
    .await
    .unwrap();
  assert_eq!(decision.request.status, LeaveStatus::Approved);
  let escalation = decision.escalation.unwrap();
  assert_eq!(escalation.status, EscalationStatus::Resolved);
  assert_eq!(escalation.resolution_notes.as_deref(), Some("covered by Bob"));
  assert!(escalation.resolved_at.is_some());

  let balance = f.annual_balance(ALICE, 2024).await;
  assert_eq!((balance.used_days, balance.pending_days), (5, 0));

  let mine = f.store.list_mine(f.session(ALICE)).await.unwrap();
  assert_eq!(
    mine[0].escalation.as_ref().map(|e| e.status),
    Some(EscalationStatus::Resolved)
  );
}

#[tokio::test]
async fn resolve_reject_records_notes_as_rejection_reason() {
  let f = fixture().await;
  let request_id = f.submit(ALICE, d(2024, 6, 10), d(2024, 6, 11)).await;
  f.decide(ADMIN, request_id, ReviewAction::Escalate).await.unwrap();

  let decision = f
    .store
    .resolve_escalation(f.session(MANAGER), request_id, "peak season".into(), FinalAction::Reject)
    .await
    .unwrap();
  assert_eq!(decision.request.status, LeaveStatus::Rejected);
  assert_eq!(decision.request.rejection_reason.as_deref(), Some("peak season"));
  assert_eq!(f.annual_balance(ALICE, 2024).await.pending_days, 0);
}

#[tokio::test]
async fn escalation_without_management_keeps_request_pending() {
  let f = fixture().await;
  f.store
    .upsert_user(UserProfile {
      is_active: false,
      ..user(MANAGER, 1, Role::Management, None)
    })
    .await
    .unwrap();
  let request_id = f.submit(ALICE, d(2024, 6, 10), d(2024, 6, 11)).await;

  let err = f.decide(ADMIN, request_id, ReviewAction::Escalate).await.unwrap_err();
  assert_eq!(core(err), CoreError::NoEscalationTargetFound { company_id: 1 });

  let mine = f.store.list_mine(f.session(ALICE)).await.unwrap();
  assert_eq!(mine[0].request.status, LeaveStatus::Pending);
  assert!(mine[0].escalation.is_none());
}

#[tokio::test]
async fn transitions_only_leave_their_source_state() {
  let f = fixture().await;
  let request_id = f.submit(ALICE, d(2024, 6, 10), d(2024, 6, 11)).await;

  let err = f
    .store
    .resolve_escalation(f.session(MANAGER), request_id, "n/a".into(), FinalAction::Approve)
    .await
    .unwrap_err();
  assert!(matches!(
    core(err),
    CoreError::InvalidStateTransition { current_status: LeaveStatus::Pending, .. }
  ));

  f.decide(ADMIN, request_id, ReviewAction::Approve).await.unwrap();
  for action in [ReviewAction::Approve, ReviewAction::Reject, ReviewAction::Escalate] {
    let err = f.decide(ADMIN, request_id, action).await.unwrap_err();
    assert!(matches!(
      core(err),
      CoreError::InvalidStateTransition { current_status: LeaveStatus::Approved, .. }
    ));
  }
  let balance = f.annual_balance(ALICE, 2024).await;
  assert_eq!((balance.used_days, balance.pending_days), (2, 0));

  let err = f.decide(ADMIN, Uuid::new_v4(), ReviewAction::Approve).await.unwrap_err();
  assert!(matches!(core(err), CoreError::NotFound { entity: "leave request", .. }));
}

#[tokio::test]
async fn concurrent_approvals_commit_once() {
  let f = fixture().await;
  let request_id = f.submit(ALICE, d(2024, 6, 10), d(2024, 6, 14)).await;

  let (a, b) = tokio::join!(
    f.decide(ADMIN, request_id, ReviewAction::Approve),
    f.decide(MANAGER, request_id, ReviewAction::Approve),
  );
  let outcomes = [a, b];
  assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
  let loser = outcomes.into_iter().find_map(Result::err).unwrap();
  assert!(matches!(
    core(loser),
    CoreError::InvalidStateTransition { current_status: LeaveStatus::Approved, .. }
  ));

  let balance = f.annual_balance(ALICE, 2024).await;
  assert_eq!((balance.used_days, balance.pending_days), (5, 0));
}

#[tokio::test]
async fn only_assigned_reviewers_decide() {
  let f = fixture().await;
  let request_id = f.submit(ALICE, d(2024, 6, 10), d(2024, 6, 11)).await;

  for reviewer in [ALICE, BOB, OTHER_MANAGER] {
    let err = f.decide(reviewer, request_id, ReviewAction::Approve).await.unwrap_err();
    assert!(matches!(core(err), CoreError::Forbidden { .. }), "reviewer {reviewer}");
  }
  // Escalation is the group admin's call.
  let err = f.decide(MANAGER, request_id, ReviewAction::Escalate).await.unwrap_err();
  assert!(matches!(core(err), CoreError::Forbidden { .. }));

  assert_eq!(f.annual_balance(ALICE, 2024).await.pending_days, 2);
}

// ─── Review queues ───────────────────────────────────────────────────────────

#[tokio::test]
async fn review_queues_follow_reporting_lines() {
  let f = fixture().await;
  let alice_request = f.submit(ALICE, d(2024, 6, 10), d(2024, 6, 11)).await;
  let admin_request = f.submit(ADMIN, d(2024, 6, 10), d(2024, 6, 11)).await;

  let admin_queue = f.store.list_pending_for_review(f.session(ADMIN)).await.unwrap();
  let ids: Vec<_> = admin_queue.iter().map(|v| v.request.request_id).collect();
  assert_eq!(ids, vec![alice_request]);

  let manager_queue = f.store.list_pending_for_review(f.session(MANAGER)).await.unwrap();
  let ids: Vec<_> = manager_queue.iter().map(|v| v.request.request_id).collect();
  assert_eq!(ids, vec![admin_request]);

  assert!(f.store.list_pending_for_review(f.session(OTHER_MANAGER)).await.unwrap().is_empty());
  let err = f.store.list_pending_for_review(f.session(ALICE)).await.unwrap_err();
  assert!(matches!(core(err), CoreError::Forbidden { .. }));

  // The admin's own request goes to management, who may approve it.
  assert_eq!(
    f.decide(MANAGER, admin_request, ReviewAction::Approve).await.unwrap(),
    LeaveStatus::Approved
  );
}

// ─── Sweep ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sweep_escalates_on_behalf_of_group_admin() {
  let f = fixture().await;
  let request_id = f.submit(ALICE, d(2024, 6, 10), d(2024, 6, 11)).await;
  f.submit(ADMIN, d(2024, 6, 10), d(2024, 6, 11)).await;

  assert!(f.store.overdue_pending(Utc::now() - Duration::hours(1)).await.unwrap().is_empty());
  // The admin's own request has no group admin and is never swept.
  let overdue = f.store.overdue_pending(Utc::now()).await.unwrap();
  assert_eq!(overdue.len(), 1);
  assert_eq!(overdue[0].request_id, request_id);

  let sweep = SweepPolicy { older_than: Duration::zero() };
  let decision = f.store.auto_escalate(request_id, sweep).await.unwrap();
  assert_eq!(decision.request.status, LeaveStatus::Escalated);
  let escalation = decision.escalation.unwrap();
  assert_eq!(escalation.escalated_by, ADMIN);
  assert_eq!(escalation.escalated_to, MANAGER);
  assert_eq!(escalation.reason, "auto-escalated after 0 hours without a decision");

  let err = f.store.auto_escalate(request_id, sweep).await.unwrap_err();
  assert!(matches!(
    core(err),
    CoreError::InvalidStateTransition { current_status: LeaveStatus::Escalated, .. }
  ));
}

//! [`SqliteStore`], the SQLite implementation of [`LeaveStore`].

use std::path::Path;

use chrono::{DateTime, Datelike as _, NaiveDate, Utc};
use leavebook_core::{
  Error as CoreError, UserId,
  authz::{Action, authorize},
  directory::{Role, Session, UserProfile},
  eligibility::{self, EligibilityContext},
  escalation::{LeaveEscalation, SweepPolicy, select_target},
  ledger::{LedgerEffect, LeaveBalance},
  lifecycle::{self, FinalAction, ReviewAction, Transition, TransitionPlan},
  registry::{LeavePolicy, LeaveType, LeaveTypeEntry, NewLeaveType},
  request::{DraftRequest, LeaveDocument, LeaveRequest, LeaveStatus, RequestView},
  store::{Decision, LeaveStore},
};
use rusqlite::{
  Connection, OptionalExtension as _, Transaction, TransactionBehavior, params,
};
use uuid::Uuid;

use crate::{Error, Result, queries, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Leavebook store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection handle is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` inside one `BEGIN IMMEDIATE` transaction on the store thread.
  async fn transact<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Transaction<'_>) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(immediate(conn, f))).await?
  }

  /// Insert or replace a directory entry without a caller.
  ///
  /// For operator seeding at startup; API callers go through
  /// [`LeaveStore::sync_user`].
  pub async fn upsert_user(&self, profile: UserProfile) -> Result<UserProfile> {
    self
      .transact(move |tx| {
        queries::upsert_user(tx, &profile)?;
        Ok(profile)
      })
      .await
  }

  /// Register a global leave type, visible to every company, unless an
  /// active global type with the same name exists already.
  ///
  /// Global types are provisioned by the operator rather than by tenants,
  /// so this bypasses authorization.
  pub async fn ensure_global_leave_type(&self, input: NewLeaveType) -> Result<LeaveType> {
    input.validate()?;
    self
      .transact(move |tx| {
        let existing: Option<i64> = tx
          .query_row(
            "SELECT leave_type_id FROM leave_types
             WHERE company_id IS NULL AND name = ?1 AND is_active = 1",
            params![input.name],
            |row| row.get(0),
          )
          .optional()?;
        let leave_type_id = match existing {
          Some(id) => id,
          None => insert_leave_type(tx, None, &input)?,
        };
        let entry = queries::find_leave_type(tx, leave_type_id)?
          .ok_or_else(|| CoreError::not_found("leave type", leave_type_id))?;
        Ok(entry.leave_type)
      })
      .await
  }
}

fn immediate<T>(
  conn: &mut Connection,
  f: impl FnOnce(&Transaction<'_>) -> Result<T>,
) -> Result<T> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let value = f(&tx)?;
  tx.commit()?;
  Ok(value)
}

fn insert_leave_type(
  tx: &Transaction<'_>,
  company_id: Option<i64>,
  input: &NewLeaveType,
) -> Result<i64> {
  tx.execute(
    "INSERT INTO leave_types (company_id, name, max_days, is_paid, requires_documentation)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    params![
      company_id,
      input.name.trim(),
      input.max_days,
      input.is_paid,
      input.requires_documentation,
    ],
  )?;
  Ok(tx.last_insert_rowid())
}

fn require_text(field: &'static str, value: Option<String>) -> Result<String> {
  match value {
    Some(v) if !v.trim().is_empty() => Ok(v),
    _ => Err(CoreError::validation(field, "is required").into()),
  }
}

// ─── Transition bodies ───────────────────────────────────────────────────────

/// Apply a planned transition: guarded status move, then its ledger effect
/// on the row the request draws from.
fn settle(
  tx: &Transaction<'_>,
  request: &mut LeaveRequest,
  plan: TransitionPlan,
  rejection_reason: Option<String>,
  now: DateTime<Utc>,
) -> Result<()> {
  let moved = queries::guarded_status_update(
    tx,
    request.request_id,
    plan.from,
    plan.to,
    rejection_reason.as_deref(),
    now,
  )?;
  if !moved {
    let current = queries::current_status(tx, request.request_id)?;
    return Err(lifecycle::stale(request.request_id, current, plan.transition).into());
  }

  if plan.effect != LedgerEffect::Hold {
    let mut balance = queries::find_balance(
      tx,
      request.user_id,
      request.leave_type_id,
      request.ledger_year(),
    )?
    .ok_or_else(|| {
      CoreError::PersistenceFailure(format!(
        "request {} has no ledger row to settle against",
        request.request_id
      ))
    })?;
    balance.apply(plan.effect, request.days_requested)?;
    queries::write_balance(tx, &balance)?;
  }

  request.status = plan.to;
  if rejection_reason.is_some() {
    request.rejection_reason = rejection_reason;
  }
  request.updated_at = now;
  Ok(())
}

/// Hand a pending request to the lowest-id active manager of the
/// requester's company.
fn escalate(
  tx: &Transaction<'_>,
  mut request: LeaveRequest,
  escalated_by: UserId,
  reason: String,
  now: DateTime<Utc>,
) -> Result<Decision> {
  let plan = lifecycle::plan(request.request_id, request.status, Transition::Escalate)?;
  let requester = queries::load_user(tx, request.user_id)?;
  let candidates = queries::management_of(tx, requester.company_id)?;
  let target = select_target(&candidates, requester.company_id).ok_or(
    CoreError::NoEscalationTargetFound { company_id: requester.company_id },
  )?;

  let escalation =
    LeaveEscalation::open(request.request_id, escalated_by, target.user_id, reason, now);
  settle(tx, &mut request, plan, None, now)?;
  queries::insert_escalation(tx, &escalation)?;

  tracing::info!(
    request_id = %request.request_id,
    escalated_by,
    escalated_to = escalation.escalated_to,
    "request escalated"
  );
  Ok(Decision { request, escalation: Some(escalation) })
}

// ─── LeaveStore impl ─────────────────────────────────────────────────────────

impl LeaveStore for SqliteStore {
  type Error = Error;

  // ── Directory ─────────────────────────────────────────────────────────────

  async fn sync_user(&self, session: Session, profile: UserProfile) -> Result<UserProfile> {
    self
      .transact(move |tx| {
        let existing = queries::find_user(tx, profile.user_id)?;
        authorize(&session, &Action::SyncDirectory {
          company_id: profile.company_id,
          existing:   existing.as_ref(),
        })?;
        queries::upsert_user(tx, &profile)?;
        tracing::info!(user_id = profile.user_id, by = session.user_id, "directory entry updated");
        Ok(profile)
      })
      .await
  }

  async fn get_user(&self, user_id: UserId) -> Result<Option<UserProfile>> {
    self
      .conn
      .call(move |conn| Ok(queries::find_user(conn, user_id)))
      .await?
  }

  // ── Registry ──────────────────────────────────────────────────────────────

  async fn create_leave_type(&self, session: Session, input: NewLeaveType) -> Result<LeaveType> {
    let company_id = input.company_id.unwrap_or(session.company_id);
    authorize(&session, &Action::ManageRegistry { company_id: Some(company_id) })?;
    input.validate()?;

    self
      .transact(move |tx| {
        let leave_type_id = insert_leave_type(tx, Some(company_id), &input)?;
        let entry = queries::find_leave_type(tx, leave_type_id)?
          .ok_or_else(|| CoreError::not_found("leave type", leave_type_id))?;
        tracing::info!(leave_type_id, company_id, name = %entry.leave_type.name, "leave type created");
        Ok(entry.leave_type)
      })
      .await
  }

  async fn set_policy(&self, session: Session, policy: LeavePolicy) -> Result<LeavePolicy> {
    self
      .transact(move |tx| {
        let entry = queries::find_leave_type(tx, policy.leave_type_id)?
          .filter(|e| e.leave_type.company_id.is_none_or(|c| c == session.company_id))
          .ok_or_else(|| CoreError::not_found("leave type", policy.leave_type_id))?;
        authorize(
          &session,
          &Action::ManageRegistry { company_id: entry.leave_type.company_id },
        )?;
        policy.validate()?;
        queries::upsert_policy(tx, &policy)?;
        Ok(policy)
      })
      .await
  }

  async fn list_leave_types(&self, session: Session) -> Result<Vec<LeaveTypeEntry>> {
    self
      .conn
      .call(move |conn| Ok(queries::visible_leave_types(conn, session.company_id)))
      .await?
  }

  // ── Ledger ────────────────────────────────────────────────────────────────

  async fn balances(
    &self,
    session: Session,
    user_id: Option<UserId>,
    year: i32,
  ) -> Result<Vec<LeaveBalance>> {
    self
      .transact(move |tx| {
        let owner = queries::load_user(tx, user_id.unwrap_or(session.user_id))?;
        authorize(&session, &Action::ViewBalances { owner: &owner })?;
        queries::ensure_balances(tx, &owner, year)?;
        queries::balances_of(tx, owner.user_id, year)
      })
      .await
  }

  // ── Lifecycle ─────────────────────────────────────────────────────────────

  async fn submit(
    &self,
    session: Session,
    draft: DraftRequest,
    today: NaiveDate,
  ) -> Result<LeaveRequest> {
    let now = Utc::now();
    self
      .transact(move |tx| {
        let requester = queries::load_user(tx, session.user_id)?;
        authorize(&session, &Action::Submit { requester: &requester })?;

        let entry = queries::find_leave_type(tx, draft.leave_type_id)?;
        let year = draft.start_date.year();
        queries::ensure_balances(tx, &requester, year)?;
        let active = queries::occupying_requests(tx, requester.user_id)?;
        let balance = queries::find_balance(tx, requester.user_id, draft.leave_type_id, year)?;

        let eligible = eligibility::evaluate(&draft, &EligibilityContext {
          session:         &session,
          joined_on:       requester.joined_on,
          leave_type:      entry.as_ref().map(|e| &e.leave_type),
          policy:          entry.as_ref().and_then(|e| e.policy.as_ref()),
          active_requests: &active,
          balance:         balance.as_ref(),
          today,
        })?;

        let DraftRequest {
          leave_type_id,
          start_date,
          end_date,
          reason,
          contact_number,
          documents,
        } = draft;
        let request = LeaveRequest {
          request_id: Uuid::new_v4(),
          user_id: requester.user_id,
          leave_type_id,
          start_date,
          end_date,
          days_requested: eligible.working_days,
          reason,
          contact_number,
          status: LeaveStatus::Pending,
          rejection_reason: None,
          group_admin_id: requester.group_admin_id,
          created_at: now,
          updated_at: now,
        };
        queries::insert_request(tx, &request)?;
        for doc in documents {
          queries::insert_document(tx, &LeaveDocument::attach(request.request_id, doc, now))?;
        }

        let mut balance = balance.ok_or_else(|| {
          CoreError::PersistenceFailure(format!(
            "no ledger row for user {} type {leave_type_id} year {year}",
            requester.user_id
          ))
        })?;
        balance.apply(LedgerEffect::Reserve, request.days_requested)?;
        queries::write_balance(tx, &balance)?;

        tracing::info!(
          request_id = %request.request_id,
          user_id = request.user_id,
          days = request.days_requested,
          "leave request submitted"
        );
        Ok(request)
      })
      .await
  }

  async fn process(
    &self,
    session: Session,
    request_id: Uuid,
    action: ReviewAction,
    reason: Option<String>,
  ) -> Result<Decision> {
    let now = Utc::now();
    self
      .transact(move |tx| {
        let mut request = queries::load_request(tx, request_id)?;

        match action {
          ReviewAction::Escalate => {
            authorize(&session, &Action::Escalate { request: &request })?;
            let reason = require_text("reason", reason)?;
            escalate(tx, request, session.user_id, reason, now)
          }
          ReviewAction::Approve | ReviewAction::Reject => {
            let requester = queries::load_user(tx, request.user_id)?;
            authorize(&session, &Action::Decide {
              request:   &request,
              requester: &requester,
            })?;
            let rejection_reason = match action {
              ReviewAction::Reject => Some(require_text("reason", reason)?),
              _ => None,
            };
            let plan = lifecycle::plan(request_id, request.status, action.into())?;
            settle(tx, &mut request, plan, rejection_reason, now)?;

            tracing::info!(
              request_id = %request_id,
              reviewer = session.user_id,
              status = %request.status,
              "request decided"
            );
            Ok(Decision { request, escalation: None })
          }
        }
      })
      .await
  }

  async fn resolve_escalation(
    &self,
    session: Session,
    request_id: Uuid,
    resolution_notes: String,
    final_action: FinalAction,
  ) -> Result<Decision> {
    let now = Utc::now();
    let transition = Transition::Resolve(final_action);
    self
      .transact(move |tx| {
        let notes = require_text("resolution_notes", Some(resolution_notes))?;
        let mut request = queries::load_request(tx, request_id)?;

        let Some(mut escalation) = queries::open_escalation(tx, request_id)? else {
          return Err(lifecycle::stale(request_id, request.status, transition).into());
        };
        authorize(&session, &Action::Resolve { escalation: &escalation })?;
        let plan = lifecycle::plan(request_id, request.status, transition)?;

        escalation.close(notes.clone(), now);
        if !queries::close_escalation(tx, &escalation)? {
          let current = queries::current_status(tx, request_id)?;
          return Err(lifecycle::stale(request_id, current, transition).into());
        }
        let rejection_reason = match final_action {
          FinalAction::Reject => Some(notes),
          FinalAction::Approve => None,
        };
        settle(tx, &mut request, plan, rejection_reason, now)?;

        tracing::info!(
          request_id = %request_id,
          resolved_by = session.user_id,
          status = %request.status,
          "escalation resolved"
        );
        Ok(Decision { request, escalation: Some(escalation) })
      })
      .await
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn list_mine(&self, session: Session) -> Result<Vec<RequestView>> {
    self
      .conn
      .call(move |conn| {
        let conn: &Connection = conn;
        Ok(
          queries::requests_of(conn, session.user_id).and_then(|requests| {
            requests.into_iter().map(|r| queries::view_of(conn, r)).collect()
          }),
        )
      })
      .await?
  }

  async fn list_pending_for_review(&self, session: Session) -> Result<Vec<RequestView>> {
    authorize(&session, &Action::Review)?;
    self
      .conn
      .call(move |conn| {
        let conn: &Connection = conn;
        let requests = match session.role {
          Role::Management => {
            queries::pending_for_manager(conn, session.user_id, session.company_id)
          }
          _ => queries::pending_for_admin(conn, session.user_id),
        };
        Ok(requests.and_then(|requests| {
          requests.into_iter().map(|r| queries::view_of(conn, r)).collect()
        }))
      })
      .await?
  }

  // ── Sweep ─────────────────────────────────────────────────────────────────

  async fn overdue_pending(&self, cutoff: DateTime<Utc>) -> Result<Vec<LeaveRequest>> {
    self
      .conn
      .call(move |conn| Ok(queries::overdue_pending(conn, cutoff)))
      .await?
  }

  async fn auto_escalate(&self, request_id: Uuid, sweep: SweepPolicy) -> Result<Decision> {
    let now = Utc::now();
    self
      .transact(move |tx| {
        let request = queries::load_request(tx, request_id)?;
        let Some(admin_id) = request.group_admin_id else {
          return Err(CoreError::validation("group_admin_id", "request has no group admin").into());
        };
        if request.status == LeaveStatus::Pending && !sweep.is_overdue(&request, now) {
          return Err(CoreError::validation("created_at", "request is not overdue yet").into());
        }
        escalate(tx, request, admin_id, sweep.reason(), now)
      })
      .await
  }
}

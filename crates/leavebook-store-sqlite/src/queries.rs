//! Statement-level reads and writes shared by the store operations.
//!
//! Every function takes a plain [`Connection`]; callers pass the open
//! transaction (which derefs to one) so all statements of an operation land
//! in the same `IMMEDIATE` transaction.

use chrono::{DateTime, Utc};
use leavebook_core::{
  CompanyId, Error as CoreError, LeaveTypeId, UserId,
  directory::{Role, UserProfile},
  escalation::{EscalationStatus, LeaveEscalation},
  ledger::LeaveBalance,
  registry::{LeavePolicy, LeaveTypeEntry},
  request::{LeaveDocument, LeaveRequest, LeaveStatus, RequestView},
};
use rusqlite::{Connection, OptionalExtension as _, params};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    BALANCE_COLUMNS, DOCUMENT_COLUMNS, ESCALATION_COLUMNS, REQUEST_COLUMNS,
    RawDocument, RawEscalation, RawLeaveType, RawRequest, RawUser, TYPE_COLUMNS,
    USER_COLUMNS, balance_from_row, decode_enum, encode_date, encode_dt, encode_enum,
    encode_uuid,
  },
};

// ─── Users ───────────────────────────────────────────────────────────────────

pub fn find_user(conn: &Connection, user_id: UserId) -> Result<Option<UserProfile>> {
  let raw = conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.user_id = ?1"),
      params![user_id],
      RawUser::from_row,
    )
    .optional()?;
  raw.map(RawUser::into_profile).transpose()
}

pub fn load_user(conn: &Connection, user_id: UserId) -> Result<UserProfile> {
  find_user(conn, user_id)?.ok_or_else(|| CoreError::not_found("user", user_id).into())
}

pub fn upsert_user(conn: &Connection, profile: &UserProfile) -> Result<()> {
  conn.execute(
    "INSERT INTO users (user_id, company_id, role, gender, group_admin_id, joined_on, is_active)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
     ON CONFLICT(user_id) DO UPDATE SET
       company_id     = excluded.company_id,
       role           = excluded.role,
       gender         = excluded.gender,
       group_admin_id = excluded.group_admin_id,
       joined_on      = excluded.joined_on,
       is_active      = excluded.is_active",
    params![
      profile.user_id,
      profile.company_id,
      encode_enum(profile.role),
      profile.gender.map(encode_enum),
      profile.group_admin_id,
      profile.joined_on.map(encode_date),
      profile.is_active,
    ],
  )?;
  Ok(())
}

/// Active management users of `company_id`, lowest id first.
pub fn management_of(conn: &Connection, company_id: CompanyId) -> Result<Vec<UserProfile>> {
  let mut stmt = conn.prepare_cached(&format!(
    "SELECT {USER_COLUMNS} FROM users u
     WHERE u.company_id = ?1 AND u.role = ?2 AND u.is_active = 1
     ORDER BY u.user_id"
  ))?;
  let raws = stmt
    .query_map(params![company_id, encode_enum(Role::Management)], RawUser::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawUser::into_profile).collect()
}

// ─── Registry ────────────────────────────────────────────────────────────────

pub fn find_leave_type(
  conn: &Connection,
  leave_type_id: LeaveTypeId,
) -> Result<Option<LeaveTypeEntry>> {
  let raw = conn
    .query_row(
      &format!(
        "SELECT {TYPE_COLUMNS}
         FROM leave_types t
         LEFT JOIN leave_policies p ON p.leave_type_id = t.leave_type_id
         WHERE t.leave_type_id = ?1"
      ),
      params![leave_type_id],
      RawLeaveType::from_row,
    )
    .optional()?;
  raw.map(RawLeaveType::into_entry).transpose()
}

/// Active types that are global or owned by `company_id`.
pub fn visible_leave_types(
  conn: &Connection,
  company_id: CompanyId,
) -> Result<Vec<LeaveTypeEntry>> {
  let mut stmt = conn.prepare_cached(&format!(
    "SELECT {TYPE_COLUMNS}
     FROM leave_types t
     LEFT JOIN leave_policies p ON p.leave_type_id = t.leave_type_id
     WHERE t.is_active = 1 AND (t.company_id IS NULL OR t.company_id = ?1)
     ORDER BY t.leave_type_id"
  ))?;
  let raws = stmt
    .query_map(params![company_id], RawLeaveType::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawLeaveType::into_entry).collect()
}

pub fn upsert_policy(conn: &Connection, policy: &LeavePolicy) -> Result<()> {
  conn.execute(
    "INSERT INTO leave_policies (
       leave_type_id, notice_period_days, max_consecutive_days, min_service_days,
       gender_specific, default_days, carry_forward_days
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
     ON CONFLICT(leave_type_id) DO UPDATE SET
       notice_period_days   = excluded.notice_period_days,
       max_consecutive_days = excluded.max_consecutive_days,
       min_service_days     = excluded.min_service_days,
       gender_specific      = excluded.gender_specific,
       default_days         = excluded.default_days,
       carry_forward_days   = excluded.carry_forward_days",
    params![
      policy.leave_type_id,
      policy.notice_period_days,
      policy.max_consecutive_days,
      policy.min_service_days,
      policy.gender_specific.map(encode_enum),
      policy.default_days,
      policy.carry_forward_days,
    ],
  )?;
  Ok(())
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

pub fn balances_of(conn: &Connection, user_id: UserId, year: i32) -> Result<Vec<LeaveBalance>> {
  let mut stmt = conn.prepare_cached(&format!(
    "SELECT {BALANCE_COLUMNS} FROM leave_balances b
     WHERE b.user_id = ?1 AND b.year = ?2
     ORDER BY b.leave_type_id"
  ))?;
  let rows = stmt
    .query_map(params![user_id, year], balance_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn find_balance(
  conn: &Connection,
  user_id: UserId,
  leave_type_id: LeaveTypeId,
  year: i32,
) -> Result<Option<LeaveBalance>> {
  Ok(
    conn
      .query_row(
        &format!(
          "SELECT {BALANCE_COLUMNS} FROM leave_balances b
           WHERE b.user_id = ?1 AND b.leave_type_id = ?2 AND b.year = ?3"
        ),
        params![user_id, leave_type_id, year],
        balance_from_row,
      )
      .optional()?,
  )
}

/// Create every missing ledger row of `owner` for `year`.
///
/// Rows that already exist are left untouched, so concurrent or repeated
/// calls converge on the same state. Returns the number of rows created.
pub fn ensure_balances(conn: &Connection, owner: &UserProfile, year: i32) -> Result<usize> {
  let types = visible_leave_types(conn, owner.company_id)?;
  let previous = balances_of(conn, owner.user_id, year - 1)?;

  let mut insert = conn.prepare_cached(
    "INSERT INTO leave_balances (
       user_id, leave_type_id, year, total_days, used_days, pending_days, carry_forward_days
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
     ON CONFLICT(user_id, leave_type_id, year) DO NOTHING",
  )?;

  let mut created = 0;
  for entry in &types {
    let prev = previous
      .iter()
      .find(|b| b.leave_type_id == entry.leave_type.leave_type_id);
    let row = LeaveBalance::opening(
      owner.user_id,
      &entry.leave_type,
      entry.policy.as_ref(),
      year,
      prev,
    );
    created += insert.execute(params![
      row.user_id,
      row.leave_type_id,
      row.year,
      row.total_days,
      row.used_days,
      row.pending_days,
      row.carry_forward_days,
    ])?;
  }

  if created > 0 {
    tracing::debug!(user_id = owner.user_id, year, created, "initialised ledger rows");
  }
  Ok(created)
}

pub fn write_balance(conn: &Connection, balance: &LeaveBalance) -> Result<()> {
  conn.execute(
    "UPDATE leave_balances SET used_days = ?1, pending_days = ?2
     WHERE user_id = ?3 AND leave_type_id = ?4 AND year = ?5",
    params![
      balance.used_days,
      balance.pending_days,
      balance.user_id,
      balance.leave_type_id,
      balance.year,
    ],
  )?;
  Ok(())
}

// ─── Requests ────────────────────────────────────────────────────────────────

fn collect_requests(
  conn: &Connection,
  sql: &str,
  params: impl rusqlite::Params,
) -> Result<Vec<LeaveRequest>> {
  let mut stmt = conn.prepare_cached(sql)?;
  let raws = stmt
    .query_map(params, RawRequest::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawRequest::into_request).collect()
}

pub fn find_request(conn: &Connection, request_id: Uuid) -> Result<Option<LeaveRequest>> {
  let raw = conn
    .query_row(
      &format!("SELECT {REQUEST_COLUMNS} FROM leave_requests r WHERE r.request_id = ?1"),
      params![encode_uuid(request_id)],
      RawRequest::from_row,
    )
    .optional()?;
  raw.map(RawRequest::into_request).transpose()
}

pub fn load_request(conn: &Connection, request_id: Uuid) -> Result<LeaveRequest> {
  find_request(conn, request_id)?
    .ok_or_else(|| CoreError::not_found("leave request", request_id).into())
}

/// Status as currently stored, for reporting a lost race.
pub fn current_status(conn: &Connection, request_id: Uuid) -> Result<LeaveStatus> {
  let status: String = conn.query_row(
    "SELECT status FROM leave_requests WHERE request_id = ?1",
    params![encode_uuid(request_id)],
    |row| row.get(0),
  )?;
  decode_enum("status", &status)
}

/// Requests of `user_id` that still occupy their dates.
pub fn occupying_requests(conn: &Connection, user_id: UserId) -> Result<Vec<LeaveRequest>> {
  let [a, b, c] = LeaveStatus::OCCUPYING.map(encode_enum);
  collect_requests(
    conn,
    &format!(
      "SELECT {REQUEST_COLUMNS} FROM leave_requests r
       WHERE r.user_id = ?1 AND r.status IN (?2, ?3, ?4)
       ORDER BY r.start_date"
    ),
    params![user_id, a, b, c],
  )
}

pub fn requests_of(conn: &Connection, user_id: UserId) -> Result<Vec<LeaveRequest>> {
  collect_requests(
    conn,
    &format!(
      "SELECT {REQUEST_COLUMNS} FROM leave_requests r
       WHERE r.user_id = ?1
       ORDER BY r.created_at DESC"
    ),
    params![user_id],
  )
}

/// Pending requests whose group admin is `admin_id`.
pub fn pending_for_admin(conn: &Connection, admin_id: UserId) -> Result<Vec<LeaveRequest>> {
  collect_requests(
    conn,
    &format!(
      "SELECT {REQUEST_COLUMNS} FROM leave_requests r
       WHERE r.group_admin_id = ?1 AND r.status = ?2 AND r.user_id != ?1
       ORDER BY r.created_at"
    ),
    params![admin_id, encode_enum(LeaveStatus::Pending)],
  )
}

/// What lands on a manager's desk: pending requests in their company filed
/// by group admins or by users without one, plus escalations addressed to
/// them.
pub fn pending_for_manager(
  conn: &Connection,
  manager_id: UserId,
  company_id: CompanyId,
) -> Result<Vec<LeaveRequest>> {
  collect_requests(
    conn,
    &format!(
      "SELECT {REQUEST_COLUMNS} FROM leave_requests r
       JOIN users u ON u.user_id = r.user_id
       WHERE r.user_id != ?1 AND (
         (r.status = ?3 AND u.company_id = ?2
            AND (u.role = ?5 OR r.group_admin_id IS NULL))
         OR (r.status = ?4 AND EXISTS (
              SELECT 1 FROM leave_escalations e
              WHERE e.request_id = r.request_id
                AND e.status = ?6 AND e.escalated_to = ?1))
       )
       ORDER BY r.created_at"
    ),
    params![
      manager_id,
      company_id,
      encode_enum(LeaveStatus::Pending),
      encode_enum(LeaveStatus::Escalated),
      encode_enum(Role::GroupAdmin),
      encode_enum(EscalationStatus::Pending),
    ],
  )
}

/// Pending requests with a group admin, created at or before `cutoff`.
pub fn overdue_pending(conn: &Connection, cutoff: DateTime<Utc>) -> Result<Vec<LeaveRequest>> {
  collect_requests(
    conn,
    &format!(
      "SELECT {REQUEST_COLUMNS} FROM leave_requests r
       WHERE r.status = ?1 AND r.group_admin_id IS NOT NULL AND r.created_at <= ?2
       ORDER BY r.created_at"
    ),
    params![encode_enum(LeaveStatus::Pending), encode_dt(cutoff)],
  )
}

pub fn insert_request(conn: &Connection, request: &LeaveRequest) -> Result<()> {
  conn.execute(
    "INSERT INTO leave_requests (
       request_id, user_id, leave_type_id, start_date, end_date, days_requested,
       reason, contact_number, status, rejection_reason, group_admin_id,
       created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    params![
      encode_uuid(request.request_id),
      request.user_id,
      request.leave_type_id,
      encode_date(request.start_date),
      encode_date(request.end_date),
      request.days_requested,
      request.reason,
      request.contact_number,
      encode_enum(request.status),
      request.rejection_reason,
      request.group_admin_id,
      encode_dt(request.created_at),
      encode_dt(request.updated_at),
    ],
  )?;
  Ok(())
}

/// Move a request from `from` to `to`. Returns `false` when the stored
/// status was no longer `from`, in which case nothing changed.
pub fn guarded_status_update(
  conn: &Connection,
  request_id: Uuid,
  from: LeaveStatus,
  to: LeaveStatus,
  rejection_reason: Option<&str>,
  at: DateTime<Utc>,
) -> Result<bool> {
  let changed = conn.execute(
    "UPDATE leave_requests
     SET status = ?1,
         rejection_reason = COALESCE(?2, rejection_reason),
         updated_at = ?3
     WHERE request_id = ?4 AND status = ?5",
    params![
      encode_enum(to),
      rejection_reason,
      encode_dt(at),
      encode_uuid(request_id),
      encode_enum(from),
    ],
  )?;
  Ok(changed == 1)
}

// ─── Documents ───────────────────────────────────────────────────────────────

pub fn insert_document(conn: &Connection, doc: &LeaveDocument) -> Result<()> {
  conn.execute(
    "INSERT INTO leave_documents (
       document_id, request_id, file_name, file_type, file_data, upload_method, uploaded_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    params![
      encode_uuid(doc.document_id),
      encode_uuid(doc.request_id),
      doc.file_name,
      doc.file_type,
      doc.file_data,
      doc.upload_method,
      encode_dt(doc.uploaded_at),
    ],
  )?;
  Ok(())
}

pub fn documents_of(conn: &Connection, request_id: Uuid) -> Result<Vec<LeaveDocument>> {
  let mut stmt = conn.prepare_cached(&format!(
    "SELECT {DOCUMENT_COLUMNS} FROM leave_documents d
     WHERE d.request_id = ?1
     ORDER BY d.uploaded_at, d.document_id"
  ))?;
  let raws = stmt
    .query_map(params![encode_uuid(request_id)], RawDocument::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawDocument::into_document).collect()
}

// ─── Escalations ─────────────────────────────────────────────────────────────

pub fn insert_escalation(conn: &Connection, esc: &LeaveEscalation) -> Result<()> {
  conn.execute(
    "INSERT INTO leave_escalations (
       escalation_id, request_id, escalated_by, escalated_to, reason, status,
       resolution_notes, created_at, resolved_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    params![
      encode_uuid(esc.escalation_id),
      encode_uuid(esc.request_id),
      esc.escalated_by,
      esc.escalated_to,
      esc.reason,
      encode_enum(esc.status),
      esc.resolution_notes,
      encode_dt(esc.created_at),
      esc.resolved_at.map(encode_dt),
    ],
  )?;
  Ok(())
}

/// The open escalation of a request, if any.
pub fn open_escalation(conn: &Connection, request_id: Uuid) -> Result<Option<LeaveEscalation>> {
  let raw = conn
    .query_row(
      &format!(
        "SELECT {ESCALATION_COLUMNS} FROM leave_escalations e
         WHERE e.request_id = ?1 AND e.status = ?2"
      ),
      params![encode_uuid(request_id), encode_enum(EscalationStatus::Pending)],
      RawEscalation::from_row,
    )
    .optional()?;
  raw.map(RawEscalation::into_escalation).transpose()
}

/// The most recent escalation of a request, open or closed.
pub fn latest_escalation(
  conn: &Connection,
  request_id: Uuid,
) -> Result<Option<LeaveEscalation>> {
  let raw = conn
    .query_row(
      &format!(
        "SELECT {ESCALATION_COLUMNS} FROM leave_escalations e
         WHERE e.request_id = ?1
         ORDER BY e.created_at DESC
         LIMIT 1"
      ),
      params![encode_uuid(request_id)],
      RawEscalation::from_row,
    )
    .optional()?;
  raw.map(RawEscalation::into_escalation).transpose()
}

/// Persist the closing of `esc`. Returns `false` if it was already closed.
pub fn close_escalation(conn: &Connection, esc: &LeaveEscalation) -> Result<bool> {
  let changed = conn.execute(
    "UPDATE leave_escalations
     SET status = ?1, resolution_notes = ?2, resolved_at = ?3
     WHERE escalation_id = ?4 AND status = ?5",
    params![
      encode_enum(esc.status),
      esc.resolution_notes,
      esc.resolved_at.map(encode_dt),
      encode_uuid(esc.escalation_id),
      encode_enum(EscalationStatus::Pending),
    ],
  )?;
  Ok(changed == 1)
}

// ─── Views ───────────────────────────────────────────────────────────────────

/// Attach documents, the ledger row drawn from and the latest escalation.
pub fn view_of(conn: &Connection, request: LeaveRequest) -> Result<RequestView> {
  let documents = documents_of(conn, request.request_id)?;
  let balance = find_balance(
    conn,
    request.user_id,
    request.leave_type_id,
    request.ledger_year(),
  )?;
  let escalation = latest_escalation(conn, request.request_id)?;
  Ok(RequestView { request, documents, balance, escalation })
}

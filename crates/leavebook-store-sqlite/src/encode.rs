//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so that text comparison orders them correctly.
//! Dates are `YYYY-MM-DD`. Enums use their snake_case names. UUIDs are stored
//! as hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use leavebook_core::{
  directory::{Gender, Role, UserProfile},
  escalation::{EscalationStatus, LeaveEscalation},
  ledger::LeaveBalance,
  registry::{LeavePolicy, LeaveType, LeaveTypeEntry},
  request::{LeaveDocument, LeaveRequest, LeaveStatus},
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

/// Column text of any enum deriving `strum::IntoStaticStr`.
pub fn encode_enum<T: Into<&'static str>>(value: T) -> &'static str { value.into() }

/// Parse enum column text, naming the column in the error.
pub fn decode_enum<T>(column: &str, s: &str) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  s.parse()
    .map_err(|e| Error::Decode(format!("{column} {s:?}: {e}")))
}

// ─── Users ───────────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str =
  "u.user_id, u.company_id, u.role, u.gender, u.group_admin_id, u.joined_on, u.is_active";

pub struct RawUser {
  pub user_id:        i64,
  pub company_id:     i64,
  pub role:           String,
  pub gender:         Option<String>,
  pub group_admin_id: Option<i64>,
  pub joined_on:      Option<String>,
  pub is_active:      bool,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:        row.get(0)?,
      company_id:     row.get(1)?,
      role:           row.get(2)?,
      gender:         row.get(3)?,
      group_admin_id: row.get(4)?,
      joined_on:      row.get(5)?,
      is_active:      row.get(6)?,
    })
  }

  pub fn into_profile(self) -> Result<UserProfile> {
    Ok(UserProfile {
      user_id:        self.user_id,
      company_id:     self.company_id,
      role:           decode_enum::<Role>("role", &self.role)?,
      gender:         self
        .gender
        .as_deref()
        .map(|g| decode_enum::<Gender>("gender", g))
        .transpose()?,
      group_admin_id: self.group_admin_id,
      joined_on:      self.joined_on.as_deref().map(decode_date).transpose()?,
      is_active:      self.is_active,
    })
  }
}

// ─── Leave types & policies ──────────────────────────────────────────────────

/// Select list for `leave_types t LEFT JOIN leave_policies p`.
pub const TYPE_COLUMNS: &str = "t.leave_type_id, t.company_id, t.name, t.max_days, t.is_paid,
   t.requires_documentation, t.is_active,
   p.leave_type_id, p.notice_period_days, p.max_consecutive_days,
   p.min_service_days, p.gender_specific, p.default_days, p.carry_forward_days";

pub struct RawLeaveType {
  pub leave_type_id:          i64,
  pub company_id:             Option<i64>,
  pub name:                   String,
  pub max_days:               i64,
  pub is_paid:                bool,
  pub requires_documentation: bool,
  pub is_active:              bool,
  // leave_policies join; every column NULL when the type has no policy
  pub policy_type_id:         Option<i64>,
  pub notice_period_days:     Option<i64>,
  pub max_consecutive_days:   Option<i64>,
  pub min_service_days:       Option<i64>,
  pub gender_specific:        Option<String>,
  pub default_days:           Option<i64>,
  pub carry_forward_days:     Option<i64>,
}

impl RawLeaveType {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      leave_type_id:          row.get(0)?,
      company_id:             row.get(1)?,
      name:                   row.get(2)?,
      max_days:               row.get(3)?,
      is_paid:                row.get(4)?,
      requires_documentation: row.get(5)?,
      is_active:              row.get(6)?,
      policy_type_id:         row.get(7)?,
      notice_period_days:     row.get(8)?,
      max_consecutive_days:   row.get(9)?,
      min_service_days:       row.get(10)?,
      gender_specific:        row.get(11)?,
      default_days:           row.get(12)?,
      carry_forward_days:     row.get(13)?,
    })
  }

  pub fn into_entry(self) -> Result<LeaveTypeEntry> {
    let policy = match self.policy_type_id {
      Some(leave_type_id) => Some(LeavePolicy {
        leave_type_id,
        notice_period_days: self.notice_period_days.unwrap_or(0),
        max_consecutive_days: self.max_consecutive_days,
        min_service_days: self.min_service_days.unwrap_or(0),
        gender_specific: self
          .gender_specific
          .as_deref()
          .map(|g| decode_enum::<Gender>("gender_specific", g))
          .transpose()?,
        default_days: self.default_days.unwrap_or(0),
        carry_forward_days: self.carry_forward_days.unwrap_or(0),
      }),
      None => None,
    };

    Ok(LeaveTypeEntry {
      leave_type: LeaveType {
        leave_type_id:          self.leave_type_id,
        company_id:             self.company_id,
        name:                   self.name,
        max_days:               self.max_days,
        is_paid:                self.is_paid,
        requires_documentation: self.requires_documentation,
        is_active:              self.is_active,
      },
      policy,
    })
  }
}

// ─── Balances ────────────────────────────────────────────────────────────────

pub const BALANCE_COLUMNS: &str = "b.user_id, b.leave_type_id, b.year, b.total_days,
   b.used_days, b.pending_days, b.carry_forward_days";

pub fn balance_from_row(row: &Row<'_>) -> rusqlite::Result<LeaveBalance> {
  Ok(LeaveBalance {
    user_id:            row.get(0)?,
    leave_type_id:      row.get(1)?,
    year:               row.get(2)?,
    total_days:         row.get(3)?,
    used_days:          row.get(4)?,
    pending_days:       row.get(5)?,
    carry_forward_days: row.get(6)?,
  })
}

// ─── Requests ────────────────────────────────────────────────────────────────

pub const REQUEST_COLUMNS: &str = "r.request_id, r.user_id, r.leave_type_id, r.start_date,
   r.end_date, r.days_requested, r.reason, r.contact_number, r.status,
   r.rejection_reason, r.group_admin_id, r.created_at, r.updated_at";

pub struct RawRequest {
  pub request_id:       String,
  pub user_id:          i64,
  pub leave_type_id:    i64,
  pub start_date:       String,
  pub end_date:         String,
  pub days_requested:   i64,
  pub reason:           String,
  pub contact_number:   String,
  pub status:           String,
  pub rejection_reason: Option<String>,
  pub group_admin_id:   Option<i64>,
  pub created_at:       String,
  pub updated_at:       String,
}

impl RawRequest {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      request_id:       row.get(0)?,
      user_id:          row.get(1)?,
      leave_type_id:    row.get(2)?,
      start_date:       row.get(3)?,
      end_date:         row.get(4)?,
      days_requested:   row.get(5)?,
      reason:           row.get(6)?,
      contact_number:   row.get(7)?,
      status:           row.get(8)?,
      rejection_reason: row.get(9)?,
      group_admin_id:   row.get(10)?,
      created_at:       row.get(11)?,
      updated_at:       row.get(12)?,
    })
  }

  pub fn into_request(self) -> Result<LeaveRequest> {
    Ok(LeaveRequest {
      request_id:       decode_uuid(&self.request_id)?,
      user_id:          self.user_id,
      leave_type_id:    self.leave_type_id,
      start_date:       decode_date(&self.start_date)?,
      end_date:         decode_date(&self.end_date)?,
      days_requested:   self.days_requested,
      reason:           self.reason,
      contact_number:   self.contact_number,
      status:           decode_enum::<LeaveStatus>("status", &self.status)?,
      rejection_reason: self.rejection_reason,
      group_admin_id:   self.group_admin_id,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Documents ───────────────────────────────────────────────────────────────

pub const DOCUMENT_COLUMNS: &str = "d.document_id, d.request_id, d.file_name, d.file_type,
   d.file_data, d.upload_method, d.uploaded_at";

pub struct RawDocument {
  pub document_id:   String,
  pub request_id:    String,
  pub file_name:     String,
  pub file_type:     String,
  pub file_data:     Vec<u8>,
  pub upload_method: String,
  pub uploaded_at:   String,
}

impl RawDocument {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      document_id:   row.get(0)?,
      request_id:    row.get(1)?,
      file_name:     row.get(2)?,
      file_type:     row.get(3)?,
      file_data:     row.get(4)?,
      upload_method: row.get(5)?,
      uploaded_at:   row.get(6)?,
    })
  }

  pub fn into_document(self) -> Result<LeaveDocument> {
    Ok(LeaveDocument {
      document_id:   decode_uuid(&self.document_id)?,
      request_id:    decode_uuid(&self.request_id)?,
      file_name:     self.file_name,
      file_type:     self.file_type,
      file_data:     self.file_data,
      upload_method: self.upload_method,
      uploaded_at:   decode_dt(&self.uploaded_at)?,
    })
  }
}

// ─── Escalations ─────────────────────────────────────────────────────────────

pub const ESCALATION_COLUMNS: &str = "e.escalation_id, e.request_id, e.escalated_by,
   e.escalated_to, e.reason, e.status, e.resolution_notes, e.created_at, e.resolved_at";

pub struct RawEscalation {
  pub escalation_id:    String,
  pub request_id:       String,
  pub escalated_by:     i64,
  pub escalated_to:     i64,
  pub reason:           String,
  pub status:           String,
  pub resolution_notes: Option<String>,
  pub created_at:       String,
  pub resolved_at:      Option<String>,
}

impl RawEscalation {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      escalation_id:    row.get(0)?,
      request_id:       row.get(1)?,
      escalated_by:     row.get(2)?,
      escalated_to:     row.get(3)?,
      reason:           row.get(4)?,
      status:           row.get(5)?,
      resolution_notes: row.get(6)?,
      created_at:       row.get(7)?,
      resolved_at:      row.get(8)?,
    })
  }

  pub fn into_escalation(self) -> Result<LeaveEscalation> {
    Ok(LeaveEscalation {
      escalation_id:    decode_uuid(&self.escalation_id)?,
      request_id:       decode_uuid(&self.request_id)?,
      escalated_by:     self.escalated_by,
      escalated_to:     self.escalated_to,
      reason:           self.reason,
      status:           decode_enum::<EscalationStatus>("escalation status", &self.status)?,
      resolution_notes: self.resolution_notes,
      created_at:       decode_dt(&self.created_at)?,
      resolved_at:      self.resolved_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

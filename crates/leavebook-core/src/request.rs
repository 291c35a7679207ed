//! Leave requests and their supporting documents.
//!
//! A request is never deleted. Its documents belong to it alone and go away
//! only if the request row itself is removed.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  LeaveTypeId, UserId, escalation::LeaveEscalation, ledger::LeaveBalance,
};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeaveStatus {
  Pending,
  Approved,
  Rejected,
  Escalated,
}

impl LeaveStatus {
  /// Statuses whose dates are taken: a new request may not intersect them.
  pub const OCCUPYING: [LeaveStatus; 3] =
    [LeaveStatus::Pending, LeaveStatus::Approved, LeaveStatus::Escalated];
}

// ─── Documents ───────────────────────────────────────────────────────────────

/// A document as uploaded alongside a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
  pub file_name:     String,
  pub file_type:     String,
  #[serde(with = "base64_bytes")]
  pub file_data:     Vec<u8>,
  #[serde(default = "default_upload_method")]
  pub upload_method: String,
}

fn default_upload_method() -> String { "file".to_owned() }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveDocument {
  pub document_id:   Uuid,
  pub request_id:    Uuid,
  pub file_name:     String,
  pub file_type:     String,
  #[serde(with = "base64_bytes")]
  pub file_data:     Vec<u8>,
  pub upload_method: String,
  pub uploaded_at:   DateTime<Utc>,
}

impl LeaveDocument {
  pub fn attach(request_id: Uuid, doc: NewDocument, at: DateTime<Utc>) -> Self {
    Self {
      document_id: Uuid::new_v4(),
      request_id,
      file_name: doc.file_name,
      file_type: doc.file_type,
      file_data: doc.file_data,
      upload_method: doc.upload_method,
      uploaded_at: at,
    }
  }
}

mod base64_bytes {
  use base64::{Engine as _, engine::general_purpose::STANDARD};
  use serde::{Deserialize as _, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&STANDARD.encode(bytes))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(d)?;
    STANDARD.decode(encoded).map_err(serde::de::Error::custom)
  }
}

// ─── Requests ────────────────────────────────────────────────────────────────

/// A submission before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftRequest {
  pub leave_type_id:  LeaveTypeId,
  pub start_date:     NaiveDate,
  pub end_date:       NaiveDate,
  pub reason:         String,
  pub contact_number: String,
  #[serde(default)]
  pub documents:      Vec<NewDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
  pub request_id:       Uuid,
  pub user_id:          UserId,
  pub leave_type_id:    LeaveTypeId,
  pub start_date:       NaiveDate,
  pub end_date:         NaiveDate,
  /// Working days, fixed at submission.
  pub days_requested:   i64,
  pub reason:           String,
  pub contact_number:   String,
  pub status:           LeaveStatus,
  pub rejection_reason: Option<String>,
  pub group_admin_id:   Option<UserId>,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

impl LeaveRequest {
  /// Ledger year the request draws from.
  pub fn ledger_year(&self) -> i32 {
    use chrono::Datelike as _;
    self.start_date.year()
  }
}

/// A request as listed to callers, with its documents, the ledger row it
/// draws from, and its latest escalation if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestView {
  #[serde(flatten)]
  pub request:    LeaveRequest,
  pub documents:  Vec<LeaveDocument>,
  pub balance:    Option<LeaveBalance>,
  pub escalation: Option<LeaveEscalation>,
}

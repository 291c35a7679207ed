//! Caller identity and the user directory.
//!
//! Sessions are issued elsewhere; this crate only consumes them. The
//! directory mirrors the facts about a user that the engine needs beyond the
//! session itself: reporting line, service start, and whether the account is
//! active.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{CompanyId, UserId};

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
pub enum Role {
  Employee,
  GroupAdmin,
  Management,
}

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
pub enum Gender {
  Male,
  Female,
  Other,
}

/// The authenticated caller of one operation, scoped to a single company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub user_id:    UserId,
  pub role:       Role,
  pub company_id: CompanyId,
  pub gender:     Option<Gender>,
}

/// Directory record for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
  pub user_id:        UserId,
  pub company_id:     CompanyId,
  pub role:           Role,
  #[serde(default)]
  pub gender:         Option<Gender>,
  /// The group admin who reviews this user's requests.
  #[serde(default)]
  pub group_admin_id: Option<UserId>,
  /// Service start date, used for minimum-service rules.
  #[serde(default)]
  pub joined_on:      Option<NaiveDate>,
  #[serde(default = "active_by_default")]
  pub is_active:      bool,
}

fn active_by_default() -> bool { true }

impl UserProfile {
  /// The session this user would carry when calling in.
  pub fn session(&self) -> Session {
    Session {
      user_id:    self.user_id,
      role:       self.role,
      company_id: self.company_id,
      gender:     self.gender,
    }
  }
}

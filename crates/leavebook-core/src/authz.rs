//! Authorization boundary.
//!
//! Every operation builds one [`Action`] describing what the caller wants to
//! do and the resource it touches, and asks [`authorize`] once.

use crate::{
  CompanyId, Error, Result,
  directory::{Role, Session, UserProfile},
  escalation::LeaveEscalation,
  request::LeaveRequest,
};

#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
  /// Submit a request on one's own behalf.
  Submit { requester: &'a UserProfile },
  /// Read (and lazily initialise) the ledger of `owner`.
  ViewBalances { owner: &'a UserProfile },
  /// List requests awaiting the caller's review.
  Review,
  /// Approve or reject a pending request.
  Decide {
    request:   &'a LeaveRequest,
    requester: &'a UserProfile,
  },
  /// Hand a pending request to management.
  Escalate { request: &'a LeaveRequest },
  /// Close an escalation with a final decision.
  Resolve { escalation: &'a LeaveEscalation },
  /// Change leave types or policies owned by `company_id`.
  ManageRegistry { company_id: Option<CompanyId> },
  /// Create or update a directory entry in `company_id`; `existing` is the
  /// entry being replaced, if any.
  SyncDirectory {
    company_id: CompanyId,
    existing:   Option<&'a UserProfile>,
  },
}

impl Action<'_> {
  pub fn name(&self) -> &'static str {
    match self {
      Self::Submit { .. } => "submit",
      Self::ViewBalances { .. } => "view balances",
      Self::Review => "review requests",
      Self::Decide { .. } => "decide on request",
      Self::Escalate { .. } => "escalate request",
      Self::Resolve { .. } => "resolve escalation",
      Self::ManageRegistry { .. } => "manage leave types",
      Self::SyncDirectory { .. } => "manage users",
    }
  }
}

/// Allow or deny `action` for `session`.
pub fn authorize(session: &Session, action: &Action<'_>) -> Result<()> {
  if permits(session, action) {
    Ok(())
  } else {
    tracing::debug!(
      user_id = session.user_id,
      role = %session.role,
      action = action.name(),
      "authorization denied"
    );
    Err(Error::Forbidden { action: action.name() })
  }
}

fn permits(session: &Session, action: &Action<'_>) -> bool {
  let manages = |company_id: CompanyId| {
    session.role == Role::Management && session.company_id == company_id
  };

  match *action {
    Action::Submit { requester } => {
      requester.user_id == session.user_id && requester.is_active
    }
    Action::ViewBalances { owner } => {
      owner.user_id == session.user_id
        || owner.group_admin_id == Some(session.user_id)
        || manages(owner.company_id)
    }
    Action::Review => matches!(session.role, Role::GroupAdmin | Role::Management),
    Action::Decide { request, requester } => {
      request.user_id != session.user_id
        && (request.group_admin_id == Some(session.user_id)
          || manages(requester.company_id))
    }
    Action::Escalate { request } => {
      session.role == Role::GroupAdmin && request.group_admin_id == Some(session.user_id)
    }
    Action::Resolve { escalation } => escalation.escalated_to == session.user_id,
    Action::ManageRegistry { company_id } => company_id.is_some_and(manages),
    Action::SyncDirectory { company_id, existing } => {
      manages(company_id) && existing.is_none_or(|u| manages(u.company_id))
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, Utc};
  use uuid::Uuid;

  use super::*;
  use crate::request::LeaveStatus;

  fn profile(user_id: i64, role: Role, group_admin_id: Option<i64>) -> UserProfile {
    UserProfile {
      user_id,
      company_id: 1,
      role,
      gender: None,
      group_admin_id,
      joined_on: None,
      is_active: true,
    }
  }

  fn request_of(user: &UserProfile) -> LeaveRequest {
    LeaveRequest {
      request_id:       Uuid::new_v4(),
      user_id:          user.user_id,
      leave_type_id:    1,
      start_date:       NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
      end_date:         NaiveDate::from_ymd_opt(2024, 6, 7).unwrap(),
      days_requested:   5,
      reason:           "holiday".into(),
      contact_number:   "555-0100".into(),
      status:           LeaveStatus::Pending,
      rejection_reason: None,
      group_admin_id:   user.group_admin_id,
      created_at:       Utc::now(),
      updated_at:       Utc::now(),
    }
  }

  #[test]
  fn assigned_admin_and_management_may_decide() {
    let employee = profile(10, Role::Employee, Some(2));
    let request = request_of(&employee);
    let action = Action::Decide { request: &request, requester: &employee };

    let admin = profile(2, Role::GroupAdmin, None).session();
    let other_admin = profile(3, Role::GroupAdmin, None).session();
    let manager = profile(1, Role::Management, None).session();
    let mut foreign_manager = manager;
    foreign_manager.company_id = 99;

    assert!(authorize(&admin, &action).is_ok());
    assert!(authorize(&manager, &action).is_ok());
    assert!(authorize(&other_admin, &action).is_err());
    assert!(authorize(&foreign_manager, &action).is_err());
    assert!(authorize(&employee.session(), &action).is_err());
  }

  #[test]
  fn nobody_decides_their_own_request() {
    let manager = profile(1, Role::Management, None);
    let request = request_of(&manager);
    let action = Action::Decide { request: &request, requester: &manager };
    assert_eq!(
      authorize(&manager.session(), &action),
      Err(Error::Forbidden { action: "decide on request" })
    );
  }

  #[test]
  fn only_assigned_group_admin_escalates() {
    let employee = profile(10, Role::Employee, Some(2));
    let request = request_of(&employee);
    let action = Action::Escalate { request: &request };

    assert!(authorize(&profile(2, Role::GroupAdmin, None).session(), &action).is_ok());
    assert!(authorize(&profile(1, Role::Management, None).session(), &action).is_err());
  }

  #[test]
  fn balances_visible_to_owner_admin_and_management() {
    let owner = profile(10, Role::Employee, Some(2));
    let action = Action::ViewBalances { owner: &owner };

    assert!(authorize(&owner.session(), &action).is_ok());
    assert!(authorize(&profile(2, Role::GroupAdmin, None).session(), &action).is_ok());
    assert!(authorize(&profile(1, Role::Management, None).session(), &action).is_ok());
    assert!(authorize(&profile(11, Role::Employee, None).session(), &action).is_err());
  }

  #[test]
  fn global_types_are_not_managed_by_tenants() {
    let manager = profile(1, Role::Management, None).session();
    assert!(authorize(&manager, &Action::ManageRegistry { company_id: Some(1) }).is_ok());
    assert!(authorize(&manager, &Action::ManageRegistry { company_id: None }).is_err());
  }

  #[test]
  fn employees_have_nothing_to_review() {
    let employee = profile(10, Role::Employee, Some(2)).session();
    assert!(authorize(&employee, &Action::Review).is_err());
  }

  #[test]
  fn directory_sync_cannot_move_users_across_companies() {
    let manager = profile(1, Role::Management, None).session();
    let local = profile(10, Role::Employee, Some(2));
    let mut foreign = profile(30, Role::Employee, None);
    foreign.company_id = 2;

    let create = Action::SyncDirectory { company_id: 1, existing: None };
    assert!(authorize(&manager, &create).is_ok());
    let update = Action::SyncDirectory { company_id: 1, existing: Some(&local) };
    assert!(authorize(&manager, &update).is_ok());
    let pull_in = Action::SyncDirectory { company_id: 1, existing: Some(&foreign) };
    assert!(authorize(&manager, &pull_in).is_err());
    let push_out = Action::SyncDirectory { company_id: 2, existing: Some(&local) };
    assert!(authorize(&manager, &push_out).is_err());
    assert!(authorize(&local.session(), &create).is_err());
  }
}

//! Eligibility rules for a draft leave request.
//!
//! [`evaluate`] is a pure function over the draft and a snapshot of the state
//! it depends on. Checks run in a fixed order and the first failure wins, so
//! a client always sees the most fundamental problem first.

use chrono::{Datelike as _, NaiveDate, TimeDelta};

use crate::{
  Error, Result,
  calendar::{intervals_overlap, working_days},
  directory::Session,
  ledger::LeaveBalance,
  registry::{LeavePolicy, LeaveType},
  request::{DraftRequest, LeaveRequest, LeaveStatus},
};

/// Everything the rules look at besides the draft itself.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityContext<'a> {
  pub session:         &'a Session,
  /// Requester's service start, if known.
  pub joined_on:       Option<NaiveDate>,
  pub leave_type:      Option<&'a LeaveType>,
  pub policy:          Option<&'a LeavePolicy>,
  /// The requester's requests that still occupy their dates.
  pub active_requests: &'a [LeaveRequest],
  /// The requester's ledger row for this type and the draft's year.
  pub balance:         Option<&'a LeaveBalance>,
  pub today:           NaiveDate,
}

/// A draft that passed every rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eligible {
  pub working_days: i64,
  pub year:         i32,
}

pub fn evaluate(draft: &DraftRequest, ctx: &EligibilityContext<'_>) -> Result<Eligible> {
  // 1. The type exists and the requester's company can see it.
  let leave_type = ctx
    .leave_type
    .filter(|lt| lt.leave_type_id == draft.leave_type_id)
    .filter(|lt| lt.visible_to(ctx.session.company_id))
    .ok_or_else(|| Error::not_found("leave type", draft.leave_type_id))?;
  let fallback;
  let policy = match ctx.policy {
    Some(p) => p,
    None => {
      fallback = LeavePolicy::fallback(leave_type);
      &fallback
    }
  };

  // 2. Who may take it.
  check_gender(ctx.session, policy)?;
  check_service(ctx.joined_on, draft.start_date, policy)?;

  // 3. Shape of the draft.
  check_dates(draft, ctx.today)?;
  check_text("reason", &draft.reason)?;
  check_text("contact_number", &draft.contact_number)?;

  // 4. Consumption.
  let days = working_days(draft.start_date, draft.end_date);
  if days == 0 {
    return Err(Error::validation(
      "end_date",
      "the requested range contains no working days",
    ));
  }

  // 5. Notice period.
  let notice = policy.notice_period_days;
  let earliest_possible_date = TimeDelta::try_days(notice)
    .and_then(|delta| ctx.today.checked_add_signed(delta))
    .ok_or_else(|| Error::validation("notice_period_days", "out of range"))?;
  if draft.start_date < earliest_possible_date {
    return Err(Error::NoticePeriodViolation {
      notice_period_days: notice,
      earliest_possible_date,
    });
  }

  // 6. Length.
  let max_days = policy.max_consecutive(leave_type);
  if days > max_days {
    return Err(Error::MaxDaysExceeded { max_days, requested_days: days });
  }

  // 7. Overlap with anything still occupying dates.
  let conflict = ctx.active_requests.iter().find(|r| {
    LeaveStatus::OCCUPYING.contains(&r.status)
      && intervals_overlap(r.start_date, r.end_date, draft.start_date, draft.end_date)
  });
  if let Some(conflict) = conflict {
    return Err(Error::OverlappingRequest {
      conflicting_request_id: conflict.request_id,
      start_date:             conflict.start_date,
      end_date:               conflict.end_date,
    });
  }

  // 8. Supporting documents.
  if leave_type.requires_documentation && draft.documents.is_empty() {
    return Err(Error::DocumentationRequired {
      leave_type_id: leave_type.leave_type_id,
    });
  }

  // 9. Balance.
  let available = ctx.balance.map(LeaveBalance::available_days).unwrap_or(0);
  if available < days {
    return Err(Error::InsufficientBalance {
      available_days: available,
      requested_days: days,
    });
  }

  Ok(Eligible { working_days: days, year: draft.start_date.year() })
}

fn check_gender(session: &Session, policy: &LeavePolicy) -> Result<()> {
  match policy.gender_specific {
    Some(required) if session.gender != Some(required) => Err(Error::NotEligible {
      reason:           format!("this leave type is restricted to {required} employees"),
      min_service_days: None,
    }),
    _ => Ok(()),
  }
}

fn check_service(
  joined_on: Option<NaiveDate>,
  start_date: NaiveDate,
  policy: &LeavePolicy,
) -> Result<()> {
  let min = policy.min_service_days;
  match joined_on {
    Some(joined) if min > 0 && (start_date - joined).num_days() < min => {
      Err(Error::NotEligible {
        reason:           format!("requires {min} day(s) of service before the leave starts"),
        min_service_days: Some(min),
      })
    }
    _ => Ok(()),
  }
}

fn check_dates(draft: &DraftRequest, today: NaiveDate) -> Result<()> {
  if draft.start_date < today {
    return Err(Error::validation("start_date", "must not be in the past"));
  }
  if draft.end_date < draft.start_date {
    return Err(Error::validation("end_date", "must not be before start_date"));
  }
  Ok(())
}

fn check_text(field: &'static str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::validation(field, "must not be blank"));
  }
  Ok(())
}

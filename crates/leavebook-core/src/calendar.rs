//! Working-day arithmetic.
//!
//! Only Monday to Friday count toward consumption. Overlap checks still use
//! the full calendar interval, weekends included.

use chrono::{Datelike as _, NaiveDate};

/// Number of Monday–Friday dates in the inclusive range `[start, end]`.
/// Zero when `end < start`. Constant time in the length of the range.
pub fn working_days(start: NaiveDate, end: NaiveDate) -> i64 {
  if end < start {
    return 0;
  }
  let span = (end - start).num_days() + 1;
  let first = i64::from(start.weekday().num_days_from_monday());
  let tail = (0..span % 7).filter(|offset| (first + offset) % 7 < 5).count() as i64;
  span / 7 * 5 + tail
}

/// `true` when the inclusive intervals `[a_start, a_end]` and
/// `[b_start, b_end]` share at least one date.
pub fn intervals_overlap(
  a_start: NaiveDate,
  a_end: NaiveDate,
  b_start: NaiveDate,
  b_end: NaiveDate,
) -> bool {
  a_start <= b_end && b_start <= a_end
}

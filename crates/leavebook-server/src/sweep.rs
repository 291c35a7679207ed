//! Periodic auto-escalation of requests nobody has decided on.
//!
//! Off unless `auto_escalate_after_hours` is configured. Each pass escalates
//! overdue pending requests on behalf of their own group admin; a request
//! that cannot be escalated (no management user, a concurrent decision) is
//! logged and left for the next pass.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use leavebook_core::{
  Error as CoreError,
  escalation::SweepPolicy,
  notify::{LeaveEvent, Notifier},
  store::LeaveStore,
};
use tokio::time::MissedTickBehavior;

/// Run one pass at `now`. Returns how many requests were escalated.
pub async fn sweep_once<S: LeaveStore>(
  store: &S,
  notifier: &dyn Notifier,
  policy: SweepPolicy,
  now: DateTime<Utc>,
) -> Result<usize, CoreError> {
  let overdue = store
    .overdue_pending(policy.cutoff(now))
    .await
    .map_err(Into::<CoreError>::into)?;

  let mut escalated = 0;
  for request in overdue {
    match store.auto_escalate(request.request_id, policy).await {
      Ok(decision) => {
        for event in LeaveEvent::from_decision(&decision) {
          notifier.notify(event);
        }
        escalated += 1;
      }
      Err(e) => {
        let e: CoreError = e.into();
        tracing::warn!(request_id = %request.request_id, error = %e, "auto-escalation skipped");
      }
    }
  }
  Ok(escalated)
}

/// Sweep every `every` until the task is dropped.
pub async fn run_sweep<S: LeaveStore>(
  store: Arc<S>,
  notifier: Arc<dyn Notifier>,
  policy: SweepPolicy,
  every: Duration,
) {
  let mut ticker = tokio::time::interval(every);
  ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
  loop {
    ticker.tick().await;
    match sweep_once(store.as_ref(), notifier.as_ref(), policy, Utc::now()).await {
      Ok(0) => {}
      Ok(n) => tracing::info!(escalated = n, "auto-escalation sweep finished"),
      Err(e) => tracing::error!(error = %e, "auto-escalation sweep failed"),
    }
  }
}

//! [`Scheduler`] — the periodic due-detection and escalation loop.
//!
//! One tick, for one kind:
//!
//! ```text
//! list tenants ─▶ per tenant: list records ─▶ classify each
//!   Inert       ─▶ skip
//!   ToSend      ─▶ dispatch ─ok─▶ persist sent/sentAt
//!   ToEscalate  ─▶ dispatch ─ok─▶ persist escalationsSent+1/lastEscalationAt
//!   record gone at persist     ─▶ log, skip
//!   dispatch or persist error ─▶ log, leave for the next tick
//! ```
//!
//! Failures are contained to the record (or tenant) they happen on. The only
//! thing that ends a tick early is not having anyone to send to.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{sync::watch, task::JoinHandle, time::Instant};
use vigil_bridge::ReminderRepository;
use vigil_core::{
  Error,
  directory::{Directory, MailTransport},
  record::{RecordKind, ReminderRecord, Transition},
  selector::{Classification, classify},
  tree::DocumentTree,
};

use crate::{
  config::EngineConfig,
  dispatch::{Dispatcher, Notice},
};

// ─── Report ──────────────────────────────────────────────────────────────────

/// What one tick did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickReport {
  pub kind:              RecordKind,
  pub started_at:        DateTime<Utc>,
  pub tenants_scanned:   usize,
  pub tenants_failed:    usize,
  pub records_seen:      usize,
  pub sent:              usize,
  pub escalated:         usize,
  /// Records deleted between listing and persisting; their notice went out
  /// but nothing was written back.
  pub vanished:          usize,
  pub dispatch_failures: usize,
  pub persist_failures:  usize,
  /// The tick stopped before visiting every tenant.
  pub aborted:           bool,
}

impl TickReport {
  pub fn new(kind: RecordKind, started_at: DateTime<Utc>) -> Self {
    Self {
      kind,
      started_at,
      tenants_scanned: 0,
      tenants_failed: 0,
      records_seen: 0,
      sent: 0,
      escalated: 0,
      vanished: 0,
      dispatch_failures: 0,
      persist_failures: 0,
      aborted: false,
    }
  }

  pub fn notices(&self) -> usize { self.sent + self.escalated }

  pub fn failures(&self) -> usize {
    self.tenants_failed + self.dispatch_failures + self.persist_failures
  }

  fn log(&self) {
    if self.aborted || self.failures() > 0 {
      tracing::warn!(kind = %self.kind, report = ?self, "tick finished with failures");
    } else {
      tracing::info!(
        kind = %self.kind,
        tenants = self.tenants_scanned,
        records = self.records_seen,
        sent = self.sent,
        escalated = self.escalated,
        vanished = self.vanished,
        "tick finished"
      );
    }
  }
}

// ─── Scheduler ───────────────────────────────────────────────────────────────

pub struct Scheduler<T, D, M> {
  records:    ReminderRepository<T>,
  dispatcher: Dispatcher<D, M>,
  config:     Arc<EngineConfig>,
}

impl<T, D, M> Clone for Scheduler<T, D, M> {
  fn clone(&self) -> Self {
    Self {
      records:    self.records.clone(),
      dispatcher: self.dispatcher.clone(),
      config:     Arc::clone(&self.config),
    }
  }
}

/// Outcome of handling one non-inert record.
enum Step {
  Sent,
  Escalated,
  Vanished,
  DispatchFailed,
  PersistFailed,
}

impl<T, D, M> Scheduler<T, D, M>
where
  T: DocumentTree,
  D: Directory + 'static,
  M: MailTransport + 'static,
{
  pub fn new(
    records: ReminderRepository<T>,
    dispatcher: Dispatcher<D, M>,
    config: Arc<EngineConfig>,
  ) -> Self {
    Self {
      records,
      dispatcher,
      config,
    }
  }

  /// Run one full pass over every tenant's records of `kind`, treating `now`
  /// as the current time.
  pub async fn run_tick(&self, kind: RecordKind, now: DateTime<Utc>) -> TickReport {
    let mut report = TickReport::new(kind, now);
    let interval = self.config.schedule(kind).escalation_interval();
    tracing::info!(%kind, "tick started");

    let tenants = match self.records.list_tenants().await {
      Ok(tenants) => tenants,
      Err(e) => {
        tracing::error!(%kind, error = %e, "could not list tenants");
        report.aborted = true;
        report.log();
        return report;
      }
    };

    // Resolved on first need, then reused for the rest of the tick.
    let mut recipient: Option<String> = None;

    for tenant in &tenants {
      let records = match self.records.list(tenant, kind).await {
        Ok(records) => records,
        Err(e) => {
          tracing::error!(tenant = %tenant, %kind, error = %e, "could not list records");
          report.tenants_failed += 1;
          continue;
        }
      };
      report.tenants_scanned += 1;
      report.records_seen += records.len();

      for record in &records {
        let (notice, transition) = match classify(record, now, interval) {
          Classification::Inert => continue,
          Classification::ToSend => (Notice::Initial, Transition::Sent { at: now }),
          Classification::ToEscalate => (
            Notice::next_follow_up(record),
            Transition::next_escalation(record, now),
          ),
        };

        let to = match recipient.take() {
          Some(to) => to,
          None => match self.dispatcher.resolve_recipient().await {
            Ok(to) => to,
            Err(e) => {
              log_recipient_failure(kind, &e);
              report.aborted = true;
              report.log();
              return report;
            }
          },
        };

        let step = self.handle(kind, record, notice, &transition, &to).await;
        recipient = Some(to);
        match step {
          Step::Sent => report.sent += 1,
          Step::Escalated => report.escalated += 1,
          Step::Vanished => report.vanished += 1,
          Step::DispatchFailed => report.dispatch_failures += 1,
          Step::PersistFailed => report.persist_failures += 1,
        }
      }
    }

    report.log();
    report
  }

  /// Dispatch, then persist only if the dispatch went through.
  async fn handle(
    &self,
    kind: RecordKind,
    record: &ReminderRecord,
    notice: Notice,
    transition: &Transition,
    to: &str,
  ) -> Step {
    let tenant = record.tenant_id.as_str();

    if let Err(e) = self.dispatcher.dispatch(to, kind, record, notice).await {
      if e.is_transient() {
        tracing::warn!(
          tenant, %kind, record = %record.id, error = %e,
          "dispatch failed; will retry next tick"
        );
      } else {
        tracing::error!(
          tenant, %kind, record = %record.id, error = %e,
          "dispatch rejected"
        );
      }
      return Step::DispatchFailed;
    }

    match self.records.apply(tenant, kind, &record.id, transition).await {
      Ok(()) => {}
      Err(Error::NotFound { .. }) => {
        tracing::info!(
          tenant, %kind, record = %record.id,
          "record removed while its notice was sent; skipping"
        );
        return Step::Vanished;
      }
      Err(e) => {
        tracing::warn!(
          tenant, %kind, record = %record.id, error = %e,
          "notice sent but not recorded"
        );
        return Step::PersistFailed;
      }
    }

    match notice {
      Notice::Initial => {
        tracing::info!(tenant, %kind, record = %record.id, "notice sent");
        Step::Sent
      }
      Notice::FollowUp { number, limit } => {
        tracing::info!(
          tenant, %kind, record = %record.id, number, limit,
          "follow-up sent"
        );
        Step::Escalated
      }
    }
  }

  /// Tick `kind` on its configured cadence until `shutdown` turns true or
  /// its sender goes away.
  ///
  /// Fires fall on `start + n * tick`. Ticks never overlap: every fire that
  /// passes while a tick is still running is dropped, and the loop waits
  /// for the first one after the tick ends. A tick in progress always
  /// finishes before shutdown is observed.
  pub async fn run(self, kind: RecordKind, mut shutdown: watch::Receiver<bool>) {
    let schedule = self.config.schedule(kind).clone();
    tracing::info!(
      %kind,
      tick_secs = schedule.tick().as_secs(),
      initial_delay_secs = schedule.initial_delay_secs,
      escalation_interval_secs = schedule.escalation_interval().num_seconds(),
      "scheduler started"
    );

    if *shutdown.borrow() {
      return;
    }

    if !schedule.initial_delay().is_zero() {
      tokio::select! {
        _ = tokio::time::sleep(schedule.initial_delay()) => {}
        _ = wait_for_shutdown(&mut shutdown) => {
          tracing::info!(%kind, "scheduler stopped before its first tick");
          return;
        }
      }
    }

    let period = schedule.tick();
    let start = Instant::now();
    let mut fire = start;

    loop {
      tokio::select! {
        _ = wait_for_shutdown(&mut shutdown) => break,
        _ = tokio::time::sleep_until(fire) => {
          self.run_tick(kind, Utc::now()).await;
          let next = next_fire(start, period, Instant::now());
          let skipped = fires_between(fire, next, period);
          if skipped > 0 {
            tracing::warn!(%kind, skipped, "tick overran its period; missed fires dropped");
          }
          fire = next;
        }
      }
    }
    tracing::info!(%kind, "scheduler stopped");
  }

  /// Run the loop for `kind` on a background task.
  pub fn spawn(
    &self,
    kind: RecordKind,
    shutdown: watch::Receiver<bool>,
  ) -> JoinHandle<()> {
    tokio::spawn(self.clone().run(kind, shutdown))
  }
}

/// The first fire on the `start + n * period` grid strictly after `now`.
fn next_fire(start: Instant, period: Duration, now: Instant) -> Instant {
  let elapsed = now.saturating_duration_since(start).as_nanos();
  let n = elapsed / period.as_nanos().max(1) + 1;
  start + period.saturating_mul(u32::try_from(n).unwrap_or(u32::MAX))
}

/// How many grid fires lie strictly between `fired` and `next`.
fn fires_between(fired: Instant, next: Instant, period: Duration) -> u64 {
  let gap = next.saturating_duration_since(fired).as_nanos();
  let fires = (gap / period.as_nanos().max(1)).saturating_sub(1);
  u64::try_from(fires).unwrap_or(u64::MAX)
}

/// Resolves once shutdown has been requested or can no longer be requested.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
  loop {
    let requested = *shutdown.borrow_and_update();
    if requested || shutdown.changed().await.is_err() {
      return;
    }
  }
}

fn log_recipient_failure(kind: RecordKind, err: &Error) {
  match err {
    Error::NoAdministratorFound => tracing::error!(
      %kind,
      "no administrator with an email address; ending tick"
    ),
    other => tracing::error!(
      %kind, error = %other,
      "could not resolve notice recipient; ending tick"
    ),
  }
}

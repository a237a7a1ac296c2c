//! End-to-end tests for the scheduler and service over `MemoryTree`.

use std::{
  sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
  },
  time::Duration,
};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde_json::{Value, json};
use tokio::{sync::watch, time::Instant};
use vigil_bridge::{
  Deadlines, HistoryRepository, MemoryTree, ReminderRepository, StoreBridge,
  TreeDirectory,
};
use vigil_core::{
  Error, Result,
  directory::{MailTransport, OutgoingMail},
  path::TreePath,
  record::{RecordKind, ReminderRecord},
};

use crate::{
  Dispatcher, EngineConfig, KindSchedule, NewReminder, ReminderService, Scheduler,
};

// ─── Fakes ───────────────────────────────────────────────────────────────────

/// A record to delete while the next message is in flight.
type Deletion = (ReminderRepository<MemoryTree>, RecordKind, ReminderRecord);

/// Records every message; can be told to fail all sends, or only those whose
/// subject mentions a given label. Sends can be slowed down, and can delete
/// a record before they complete.
#[derive(Default)]
struct FakeMail {
  sent:     Mutex<Vec<OutgoingMail>>,
  started:  Mutex<Vec<Instant>>,
  latency:  Mutex<Duration>,
  delete:   Mutex<Option<Deletion>>,
  down:     AtomicBool,
  fail_for: Mutex<Option<String>>,
}

impl FakeMail {
  fn sent(&self) -> Vec<OutgoingMail> { self.sent.lock().unwrap().clone() }

  fn started(&self) -> Vec<Instant> { self.started.lock().unwrap().clone() }

  fn set_down(&self, down: bool) { self.down.store(down, Ordering::SeqCst); }

  fn set_latency(&self, latency: Duration) { *self.latency.lock().unwrap() = latency; }

  fn fail_for(&self, label: &str) { *self.fail_for.lock().unwrap() = Some(label.to_owned()); }

  fn delete_during_next_send(&self, deletion: Deletion) {
    *self.delete.lock().unwrap() = Some(deletion);
  }
}

impl MailTransport for FakeMail {
  async fn send(&self, mail: &OutgoingMail) -> Result<()> {
    self.started.lock().unwrap().push(Instant::now());
    let latency = *self.latency.lock().unwrap();
    if !latency.is_zero() {
      tokio::time::sleep(latency).await;
    }
    let deletion = self.delete.lock().unwrap().take();
    if let Some((records, kind, record)) = deletion {
      records.delete(&record.tenant_id, kind, &record.id).await?;
    }

    if self.down.load(Ordering::SeqCst) {
      return Err(Error::Transport("connection refused".into()));
    }
    if let Some(label) = self.fail_for.lock().unwrap().as_deref()
      && mail.subject.contains(label)
    {
      return Err(Error::Transport("mailbox unavailable".into()));
    }
    self.sent.lock().unwrap().push(mail.clone());
    Ok(())
  }
}

// ─── Harness ─────────────────────────────────────────────────────────────────

type TestScheduler = Scheduler<MemoryTree, TreeDirectory<MemoryTree>, FakeMail>;

struct Harness {
  tree:      MemoryTree,
  mail:      Arc<FakeMail>,
  records:   ReminderRepository<MemoryTree>,
  scheduler: TestScheduler,
  service:   ReminderService<
    MemoryTree,
    TreeDirectory<MemoryTree>,
    TreeDirectory<MemoryTree>,
  >,
}

fn users() -> Value {
  json!({
    "u1": {"role": "technician", "email": "tech@example.com", "firstName": "Tess"},
    "u2": {"role": "SuperAdmin", "email": "", "firstName": "Nomail"},
    "u3": {"role": "superadmin", "email": "boss@example.com", "firstName": "Ada", "lastName": "Lovelace"},
    "u4": {"role": "superadmin", "email": "second@example.com"}
  })
}

fn harness_with(root: Value, config: EngineConfig) -> Harness {
  let tree = MemoryTree::with_root(root);
  let bridge = StoreBridge::new(
    Arc::new(tree.clone()),
    Deadlines {
      read:  Duration::from_millis(200),
      list:  Duration::from_millis(200),
      write: Duration::from_millis(200),
    },
  );
  let directory = Arc::new(TreeDirectory::new(bridge.clone()));
  let mail = Arc::new(FakeMail::default());
  let records = ReminderRepository::new(bridge.clone());
  let config = Arc::new(config);

  let dispatcher = Dispatcher::new(
    Arc::clone(&directory),
    Arc::clone(&mail),
    config.administrator_role.clone(),
  );
  let scheduler = Scheduler::new(records.clone(), dispatcher, config);
  let service = ReminderService::new(
    records.clone(),
    HistoryRepository::new(bridge),
    Arc::clone(&directory),
    directory,
  );

  Harness {
    tree,
    mail,
    records,
    scheduler,
    service,
  }
}

fn harness() -> Harness {
  harness_with(
    json!({
      "users": users(),
      "tenants": {
        "acme": {"machines": {"press-1": {"name": "Press #1"}}},
        "globex": {"machines": {"lathe-2": {"name": "Lathe #2"}}}
      }
    }),
    EngineConfig::default(),
  )
}

fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 5, 10, 12, 0, 0).unwrap() }

/// The default reminder escalation interval.
fn interval() -> TimeDelta { TimeDelta::minutes(5) }

fn pending(tenant: &str, label: &str, scheduled_at: DateTime<Utc>) -> ReminderRecord {
  let mut record = ReminderRecord::pending(tenant, "press-1", scheduled_at);
  record.subject_label = label.into();
  record
}

fn escalating(sent_at: DateTime<Utc>, limit: u32, done: u32) -> ReminderRecord {
  let mut record = pending("acme", "Press #1", sent_at - TimeDelta::days(1));
  record.sent = true;
  record.sent_at = Some(sent_at);
  record.escalation_enabled = true;
  record.escalation_limit = limit;
  record.escalations_sent = done;
  record
}

impl Harness {
  async fn seed(&self, kind: RecordKind, record: ReminderRecord) -> ReminderRecord {
    self.records.create(kind, record).await.unwrap()
  }

  async fn stored(&self, kind: RecordKind, record: &ReminderRecord) -> ReminderRecord {
    self.records.get(&record.tenant_id, kind, &record.id).await.unwrap()
  }

  fn raw(&self, kind: RecordKind, record: &ReminderRecord) -> Value {
    let path = format!("tenants/{}/{}/{}", record.tenant_id, kind.collection(), record.id);
    self.tree.peek(&TreePath::parse(&path).unwrap())
  }
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn due_record_is_sent_once() {
  let h = harness();
  let record = h
    .seed(RecordKind::Reminder, pending("acme", "Press #1", now() - TimeDelta::days(1)))
    .await;

  let report = h.scheduler.run_tick(RecordKind::Reminder, now()).await;
  assert_eq!(report.sent, 1);
  assert_eq!(report.escalated, 0);
  assert!(!report.aborted);

  let stored = h.stored(RecordKind::Reminder, &record).await;
  assert!(stored.sent);
  assert_eq!(stored.sent_at, Some(now()));
  assert_eq!(stored.escalations_sent, 0);

  let sent = h.mail.sent();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].to, "boss@example.com");
  assert_eq!(sent[0].subject, "Reminder for machine check - Press #1");

  // Same instant again: nothing more is owed.
  let again = h.scheduler.run_tick(RecordKind::Reminder, now()).await;
  assert_eq!(again.notices(), 0);
  assert_eq!(h.mail.sent().len(), 1);
}

#[tokio::test]
async fn future_record_is_left_alone() {
  let h = harness();
  let record = h
    .seed(RecordKind::Reminder, pending("acme", "Press #1", now() + TimeDelta::hours(1)))
    .await;
  let before = h.raw(RecordKind::Reminder, &record);

  let report = h.scheduler.run_tick(RecordKind::Reminder, now()).await;
  assert_eq!(report.records_seen, 1);
  assert_eq!(report.notices(), 0);
  assert_eq!(h.raw(RecordKind::Reminder, &record), before);
}

#[tokio::test]
async fn overdue_follow_up_is_escalated() {
  let h = harness();
  let mut record = escalating(now() - TimeDelta::hours(3), 3, 1);
  record.last_escalation_at = Some(now() - interval() * 2);
  let record = h.seed(RecordKind::Reminder, record).await;

  let report = h.scheduler.run_tick(RecordKind::Reminder, now()).await;
  assert_eq!(report.escalated, 1);

  let stored = h.stored(RecordKind::Reminder, &record).await;
  assert_eq!(stored.escalations_sent, 2);
  assert_eq!(stored.last_escalation_at, Some(now()));
  assert_eq!(stored.sent_at, record.sent_at);

  let sent = h.mail.sent();
  assert_eq!(
    sent[0].subject,
    "FOLLOW-UP - Reminder for machine check - Press #1"
  );
  assert!(sent[0].body.contains("follow-up 2/3"));
}

#[tokio::test]
async fn exhausted_escalations_stay_quiet() {
  let h = harness();
  let mut record = escalating(now() - TimeDelta::hours(3), 3, 3);
  record.last_escalation_at = Some(now() - interval() * 2);
  let record = h.seed(RecordKind::Reminder, record).await;
  let before = h.raw(RecordKind::Reminder, &record);

  let report = h.scheduler.run_tick(RecordKind::Reminder, now()).await;
  assert_eq!(report.notices(), 0);
  assert!(h.mail.sent().is_empty());
  assert_eq!(h.raw(RecordKind::Reminder, &record), before);
}

#[tokio::test]
async fn confirmation_silences_everything() {
  let h = harness();
  let mut record = pending("acme", "Press #1", now() - TimeDelta::days(1));
  record.confirmed = true;
  record.confirmed_at = Some(now() - TimeDelta::hours(1));
  h.seed(RecordKind::Reminder, record).await;

  let report = h.scheduler.run_tick(RecordKind::Reminder, now()).await;
  assert_eq!(report.records_seen, 1);
  assert_eq!(report.notices(), 0);
  assert!(h.mail.sent().is_empty());
}

#[tokio::test]
async fn failed_dispatch_leaves_the_record_untouched() {
  let h = harness();
  let record = h
    .seed(RecordKind::Reminder, pending("acme", "Press #1", now() - TimeDelta::days(1)))
    .await;
  let before = h.raw(RecordKind::Reminder, &record);
  let writes = h.tree.write_count();

  h.mail.set_down(true);
  let report = h.scheduler.run_tick(RecordKind::Reminder, now()).await;
  assert_eq!(report.dispatch_failures, 1);
  assert_eq!(report.sent, 0);
  assert_eq!(h.raw(RecordKind::Reminder, &record), before);
  assert_eq!(h.tree.write_count(), writes);
  assert!(!h.stored(RecordKind::Reminder, &record).await.sent);

  // The transport recovers and the next tick catches up.
  h.mail.set_down(false);
  let report = h.scheduler.run_tick(RecordKind::Reminder, now() + interval()).await;
  assert_eq!(report.sent, 1);
  assert!(h.stored(RecordKind::Reminder, &record).await.sent);
}

#[tokio::test]
async fn failed_escalation_dispatch_keeps_the_count() {
  let h = harness();
  let record = h
    .seed(RecordKind::Reminder, escalating(now() - TimeDelta::hours(1), 2, 0))
    .await;
  let before = h.raw(RecordKind::Reminder, &record);

  h.mail.set_down(true);
  h.scheduler.run_tick(RecordKind::Reminder, now()).await;
  assert_eq!(h.raw(RecordKind::Reminder, &record), before);
}

// ─── Isolation ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn one_failing_record_does_not_stop_the_rest() {
  let h = harness();
  let due = now() - TimeDelta::days(1);
  let bad = h.seed(RecordKind::Alert, pending("acme", "Broken", due)).await;
  let good = h.seed(RecordKind::Alert, pending("acme", "Press #1", due)).await;
  let other = h.seed(RecordKind::Alert, pending("globex", "Lathe #2", due)).await;

  h.mail.fail_for("Broken");
  let report = h.scheduler.run_tick(RecordKind::Alert, now()).await;
  assert_eq!(report.tenants_scanned, 2);
  assert_eq!(report.sent, 2);
  assert_eq!(report.dispatch_failures, 1);

  assert!(!h.stored(RecordKind::Alert, &bad).await.sent);
  assert!(h.stored(RecordKind::Alert, &good).await.sent);
  assert!(h.stored(RecordKind::Alert, &other).await.sent);
}

#[tokio::test]
async fn unreadable_tenant_does_not_stop_the_rest() {
  let h = harness_with(
    json!({
      "users": users(),
      "tenants": {
        "bad.tenant": {"alerts": {"a1": {"scheduledAt": 0}}},
        "globex": {"alerts": {"a2": {"scheduledAt": 0, "subjectLabel": "Lathe #2"}}}
      }
    }),
    EngineConfig::default(),
  );

  let report = h.scheduler.run_tick(RecordKind::Alert, now()).await;
  assert_eq!(report.tenants_failed, 1);
  assert_eq!(report.tenants_scanned, 1);
  assert_eq!(report.sent, 1);
  assert!(!report.aborted);
}

#[tokio::test]
async fn failed_persist_is_counted_and_other_records_proceed() {
  let h = harness();
  let due = now() - TimeDelta::days(1);
  let locked = h.seed(RecordKind::Reminder, pending("acme", "Press #1", due)).await;
  let open = h.seed(RecordKind::Reminder, pending("globex", "Lathe #2", due)).await;
  h.tree.deny_writes_under(TreePath::parse("tenants/acme").unwrap());

  let report = h.scheduler.run_tick(RecordKind::Reminder, now()).await;
  assert_eq!(report.persist_failures, 1);
  assert_eq!(report.sent, 1);
  assert_eq!(h.mail.sent().len(), 2);
  assert!(!h.stored(RecordKind::Reminder, &locked).await.sent);
  assert!(h.stored(RecordKind::Reminder, &open).await.sent);
}

#[tokio::test]
async fn record_deleted_mid_dispatch_is_not_brought_back() {
  let h = harness();
  let due = now() - TimeDelta::days(1);
  let doomed = h.seed(RecordKind::Reminder, pending("acme", "Press #1", due)).await;
  let kept = h.seed(RecordKind::Reminder, pending("globex", "Lathe #2", due)).await;
  h.mail
    .delete_during_next_send((h.records.clone(), RecordKind::Reminder, doomed.clone()));

  let report = h.scheduler.run_tick(RecordKind::Reminder, now()).await;
  assert_eq!(report.vanished, 1);
  assert_eq!(report.sent, 1);
  assert_eq!(report.persist_failures, 0);
  assert_eq!(h.mail.sent().len(), 2);

  assert_eq!(h.raw(RecordKind::Reminder, &doomed), Value::Null);
  assert!(h.records.list("acme", RecordKind::Reminder).await.unwrap().is_empty());
  assert!(
    h.service
      .list_active("acme", RecordKind::Reminder)
      .await
      .unwrap()
      .is_empty()
  );
  assert!(h.stored(RecordKind::Reminder, &kept).await.sent);

  // Nothing resurfaces on the next tick either.
  let again = h.scheduler.run_tick(RecordKind::Reminder, now() + interval()).await;
  assert_eq!(again.notices(), 0);
  assert_eq!(h.mail.sent().len(), 2);
}

#[tokio::test]
async fn kinds_are_scanned_independently() {
  let h = harness();
  let due = now() - TimeDelta::days(1);
  let alert = h.seed(RecordKind::Alert, pending("acme", "Press #1", due)).await;
  let reminder = h.seed(RecordKind::Reminder, pending("acme", "Press #1", due)).await;

  h.scheduler.run_tick(RecordKind::Alert, now()).await;
  assert!(h.stored(RecordKind::Alert, &alert).await.sent);
  assert!(!h.stored(RecordKind::Reminder, &reminder).await.sent);
  assert_eq!(h.mail.sent()[0].subject, "Alert for machine check - Press #1");
}

// ─── Recipient ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_administrator_aborts_the_tick() {
  let h = harness_with(
    json!({
      "users": {"u1": {"role": "technician", "email": "tech@example.com"}},
      "tenants": {"acme": {"machines": {"press-1": {"name": "Press #1"}}}}
    }),
    EngineConfig::default(),
  );
  let record = h
    .seed(RecordKind::Reminder, pending("acme", "Press #1", now() - TimeDelta::days(1)))
    .await;
  let before = h.raw(RecordKind::Reminder, &record);

  let report = h.scheduler.run_tick(RecordKind::Reminder, now()).await;
  assert!(report.aborted);
  assert_eq!(report.notices(), 0);
  assert!(h.mail.sent().is_empty());
  assert_eq!(h.raw(RecordKind::Reminder, &record), before);
}

#[tokio::test]
async fn recipient_is_only_needed_when_something_is_owed() {
  let h = harness_with(json!({}), EngineConfig::default());
  h.seed(RecordKind::Alert, pending("acme", "Press #1", now() + TimeDelta::days(1)))
    .await;

  let report = h.scheduler.run_tick(RecordKind::Alert, now()).await;
  assert!(!report.aborted);
  assert_eq!(report.records_seen, 1);
}

#[tokio::test]
async fn configured_role_is_honoured() {
  let config = EngineConfig {
    administrator_role: "technician".into(),
    ..EngineConfig::default()
  };
  let h = harness_with(json!({"users": users()}), config);
  h.seed(RecordKind::Alert, pending("acme", "Press #1", now() - TimeDelta::days(1)))
    .await;

  h.scheduler.run_tick(RecordKind::Alert, now()).await;
  assert_eq!(h.mail.sent()[0].to, "tech@example.com");
}

// ─── Over many ticks ─────────────────────────────────────────────────────────

#[tokio::test]
async fn escalations_are_monotonic_and_bounded() {
  let h = harness();
  let mut record = pending("acme", "Press #1", now());
  record.escalation_enabled = true;
  record.escalation_limit = 2;
  let record = h.seed(RecordKind::Reminder, record).await;

  let mut last = 0;
  for step in 0..8 {
    let at = now() + interval() * step;
    h.scheduler.run_tick(RecordKind::Reminder, at).await;
    let stored = h.stored(RecordKind::Reminder, &record).await;
    assert!(stored.sent);
    assert!(stored.escalations_sent >= last);
    assert!(stored.escalations_sent <= stored.escalation_limit);
    last = stored.escalations_sent;
  }
  assert_eq!(last, 2);
  assert_eq!(h.mail.sent().len(), 3);
}

#[tokio::test]
async fn follow_ups_wait_for_the_interval() {
  let h = harness();
  let record = h
    .seed(RecordKind::Reminder, escalating(now(), 3, 0))
    .await;

  let early = h
    .scheduler
    .run_tick(RecordKind::Reminder, now() + interval() - TimeDelta::seconds(1))
    .await;
  assert_eq!(early.escalated, 0);

  let on_time = h.scheduler.run_tick(RecordKind::Reminder, now() + interval()).await;
  assert_eq!(on_time.escalated, 1);
  assert_eq!(h.stored(RecordKind::Reminder, &record).await.escalations_sent, 1);
}

// ─── Timer loop ──────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn loop_ticks_until_shutdown() {
  let config = EngineConfig {
    alerts: KindSchedule {
      tick_secs:                60,
      initial_delay_secs:       0,
      escalation_interval_secs: None,
    },
    ..EngineConfig::default()
  };
  let h = harness_with(json!({"users": users()}), config);
  let long_ago = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
  let record = h.seed(RecordKind::Alert, pending("acme", "Press #1", long_ago)).await;

  let (shutdown_tx, shutdown_rx) = watch::channel(false);
  let handle = h.scheduler.spawn(RecordKind::Alert, shutdown_rx);

  tokio::time::sleep(Duration::from_secs(1)).await;
  assert!(h.stored(RecordKind::Alert, &record).await.sent);
  assert_eq!(h.mail.sent().len(), 1);

  shutdown_tx.send(true).unwrap();
  handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn overrunning_tick_skips_missed_fires_instead_of_queueing() {
  let config = EngineConfig {
    alerts: KindSchedule {
      tick_secs:                60,
      initial_delay_secs:       0,
      escalation_interval_secs: None,
    },
    ..EngineConfig::default()
  };
  let h = harness_with(json!({"users": users()}), config);
  let long_ago = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
  h.seed(RecordKind::Alert, pending("acme", "Press #1", long_ago)).await;
  // Every tick re-sends, and every send outlasts the period.
  h.tree.deny_writes_under(TreePath::parse("tenants/acme").unwrap());
  h.mail.set_latency(Duration::from_secs(90));

  let (shutdown_tx, shutdown_rx) = watch::channel(false);
  let start = Instant::now();
  let handle = h.scheduler.spawn(RecordKind::Alert, shutdown_rx);

  tokio::time::sleep(Duration::from_secs(300)).await;
  shutdown_tx.send(true).unwrap();
  handle.await.unwrap();

  let offsets: Vec<u64> = h
    .mail
    .started()
    .into_iter()
    .map(|at| (at - start).as_secs())
    .collect();
  assert_eq!(offsets, [0, 120, 240]);
}

#[tokio::test(start_paused = true)]
async fn shutdown_during_initial_delay_skips_every_tick() {
  let h = harness_with(json!({"users": users()}), EngineConfig::default());
  let long_ago = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
  h.seed(RecordKind::Reminder, pending("acme", "Press #1", long_ago)).await;

  let (shutdown_tx, shutdown_rx) = watch::channel(false);
  let handle = h.scheduler.spawn(RecordKind::Reminder, shutdown_rx);
  tokio::time::sleep(Duration::from_secs(5)).await;
  shutdown_tx.send(true).unwrap();
  handle.await.unwrap();
  assert!(h.mail.sent().is_empty());
}

// ─── Authoring and confirmation ──────────────────────────────────────────────

fn new_reminder(machine: &str, escalate: bool) -> NewReminder {
  NewReminder {
    tenant_id:          "acme".into(),
    machine_id:         machine.into(),
    description:        "Check hydraulic oil".into(),
    scheduled_at:       now(),
    escalation_enabled: escalate,
    escalation_limit:   4,
    created_by:         "u3".into(),
  }
}

#[tokio::test]
async fn create_denormalises_labels() {
  let h = harness();
  let record = h
    .service
    .create(RecordKind::Reminder, new_reminder("press-1", true))
    .await
    .unwrap();

  assert_eq!(record.subject_label, "Press #1");
  assert_eq!(record.created_by_label, "Ada Lovelace");
  assert_eq!(record.escalation_limit, 4);
  assert_eq!(record.escalations_sent, 0);
  assert!(!record.sent && !record.confirmed);

  let stored = h.stored(RecordKind::Reminder, &record).await;
  assert_eq!(stored.subject_label, "Press #1");
}

#[tokio::test]
async fn disabled_escalation_stores_no_limit() {
  let h = harness();
  let record = h
    .service
    .create(RecordKind::Alert, new_reminder("press-1", false))
    .await
    .unwrap();
  assert!(!record.escalation_enabled);
  assert_eq!(record.escalation_limit, 0);
}

#[tokio::test]
async fn unknown_machine_is_rejected() {
  let h = harness();
  let err = h
    .service
    .create(RecordKind::Alert, new_reminder("ghost", true))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::MachineNotFound { .. }));
  assert!(h.records.list("acme", RecordKind::Alert).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_author_leaves_the_label_blank() {
  let h = harness();
  let mut new = new_reminder("press-1", true);
  new.created_by = "nobody".into();
  let record = h.service.create(RecordKind::Alert, new).await.unwrap();
  assert_eq!(record.created_by, "nobody");
  assert_eq!(record.created_by_label, "");
}

#[tokio::test]
async fn confirm_records_history_once() {
  let h = harness();
  let record = h
    .service
    .create(RecordKind::Reminder, new_reminder("press-1", true))
    .await
    .unwrap();
  let at = now() + TimeDelta::hours(2);

  let entry = h
    .service
    .confirm("acme", RecordKind::Reminder, &record.id, "u3", at)
    .await
    .unwrap();
  assert_eq!(entry.subject_id, "press-1");
  assert_eq!(entry.subject_label, "Press #1");
  assert_eq!(entry.scheduled_at, now());
  assert_eq!(entry.confirmed_at, at);
  assert_eq!(entry.confirmed_by_label, "Ada Lovelace");

  let stored = h.stored(RecordKind::Reminder, &record).await;
  assert!(stored.confirmed);
  assert_eq!(stored.confirmed_at, Some(at));

  let err = h
    .service
    .confirm("acme", RecordKind::Reminder, &record.id, "u3", at)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::AlreadyConfirmed { .. }));
  assert_eq!(h.service.history("acme").await.unwrap().len(), 1);
}

#[tokio::test]
async fn confirm_missing_record_is_not_found() {
  let h = harness();
  let err = h
    .service
    .confirm("acme", RecordKind::Alert, "gone", "u3", now())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFound { .. }));
  assert!(h.service.history("acme").await.unwrap().is_empty());
}

#[tokio::test]
async fn active_and_confirmed_views_split_the_collection() {
  let h = harness();
  let first = h
    .service
    .create(RecordKind::Alert, new_reminder("press-1", false))
    .await
    .unwrap();
  let second = h
    .service
    .create(RecordKind::Alert, new_reminder("press-1", false))
    .await
    .unwrap();
  h.service
    .confirm("acme", RecordKind::Alert, &first.id, "u3", now())
    .await
    .unwrap();

  let active = h.service.list_active("acme", RecordKind::Alert).await.unwrap();
  let confirmed = h.service.list_confirmed("acme", RecordKind::Alert).await.unwrap();
  assert_eq!(active.len(), 1);
  assert_eq!(active[0].id, second.id);
  assert_eq!(confirmed.len(), 1);
  assert_eq!(confirmed[0].id, first.id);
}

#[tokio::test]
async fn confirmed_records_are_never_notified() {
  let h = harness();
  let record = h
    .service
    .create(RecordKind::Reminder, new_reminder("press-1", true))
    .await
    .unwrap();
  h.service
    .confirm("acme", RecordKind::Reminder, &record.id, "u3", now())
    .await
    .unwrap();

  let report = h
    .scheduler
    .run_tick(RecordKind::Reminder, now() + TimeDelta::days(1))
    .await;
  assert_eq!(report.notices(), 0);
  assert!(h.mail.sent().is_empty());
}

//! Reminder records — the scheduled equipment checks the engine watches.
//!
//! Alerts and reminders share one shape and one lifecycle; they differ only
//! in the collection they live in and the cadence that scans them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

// ─── Kind ────────────────────────────────────────────────────────────────────

/// Which of the two sibling collections a record belongs to.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecordKind {
  Alert,
  Reminder,
}

impl RecordKind {
  /// Name of the per-tenant collection holding records of this kind.
  pub fn collection(self) -> &'static str {
    match self {
      Self::Alert => "alerts",
      Self::Reminder => "reminders",
    }
  }

  /// Capitalised noun used in outgoing messages.
  pub fn title(self) -> &'static str {
    match self {
      Self::Alert => "Alert",
      Self::Reminder => "Reminder",
    }
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// One scheduled check on one machine.
///
/// `sent_at` is set exactly when `sent` is, and `confirmed_at` exactly when
/// `confirmed` is. `escalations_sent` never decreases and never exceeds
/// `escalation_limit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderRecord {
  /// Store-assigned key, unique within the tenant's collection.
  pub id:                 String,
  pub tenant_id:          String,
  pub subject_id:         String,
  /// Machine label, denormalised at authoring time.
  pub subject_label:      String,
  pub description:        String,
  pub scheduled_at:       DateTime<Utc>,
  pub sent:               bool,
  pub sent_at:            Option<DateTime<Utc>>,
  pub escalation_enabled: bool,
  pub escalation_limit:   u32,
  pub escalations_sent:   u32,
  pub last_escalation_at: Option<DateTime<Utc>>,
  pub confirmed:          bool,
  pub confirmed_at:       Option<DateTime<Utc>>,
  pub created_by:         String,
  pub created_by_label:   String,
  pub created_at:         Option<DateTime<Utc>>,
  pub updated_at:         Option<DateTime<Utc>>,
}

impl ReminderRecord {
  /// A fresh, pending record. The id is left empty for the store to assign.
  pub fn pending(
    tenant_id: impl Into<String>,
    subject_id: impl Into<String>,
    scheduled_at: DateTime<Utc>,
  ) -> Self {
    Self {
      id: String::new(),
      tenant_id: tenant_id.into(),
      subject_id: subject_id.into(),
      subject_label: String::new(),
      description: String::new(),
      scheduled_at,
      sent: false,
      sent_at: None,
      escalation_enabled: false,
      escalation_limit: 0,
      escalations_sent: 0,
      last_escalation_at: None,
      confirmed: false,
      confirmed_at: None,
      created_by: String::new(),
      created_by_label: String::new(),
      created_at: None,
      updated_at: None,
    }
  }

  /// When the most recent notice went out: the last escalation if any,
  /// otherwise the initial send.
  pub fn last_notice_at(&self) -> Option<DateTime<Utc>> {
    self.last_escalation_at.or(self.sent_at)
  }
}

// ─── Transitions ─────────────────────────────────────────────────────────────

/// A state change applied to a stored record. Each variant names exactly the
/// fields it writes; nothing else on the record is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
  /// Writes `sent` and `sent_at`.
  Sent { at: DateTime<Utc> },
  /// Writes `escalations_sent` and `last_escalation_at`.
  Escalated { count: u32, at: DateTime<Utc> },
  /// Writes `confirmed`, `confirmed_at` and `updated_at`.
  Confirmed { at: DateTime<Utc> },
}

impl Transition {
  /// The escalation that follows the record's current count.
  pub fn next_escalation(record: &ReminderRecord, at: DateTime<Utc>) -> Self {
    Self::Escalated {
      count: record.escalations_sent.saturating_add(1),
      at,
    }
  }

  /// Apply the transition to an in-memory copy of the record.
  pub fn apply(&self, record: &mut ReminderRecord) {
    match *self {
      Self::Sent { at } => {
        record.sent = true;
        record.sent_at = Some(at);
      }
      Self::Escalated { count, at } => {
        record.escalations_sent = record.escalations_sent.max(count);
        record.last_escalation_at = Some(at);
      }
      Self::Confirmed { at } => {
        record.confirmed = true;
        record.confirmed_at = Some(at);
        record.updated_at = Some(at);
      }
    }
  }
}

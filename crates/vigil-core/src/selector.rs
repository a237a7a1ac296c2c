//! The due-item selector: the single place that decides whether a record
//! needs a notice right now.
//!
//! [`classify`] is pure. It performs no I/O and reads nothing but its
//! arguments, so the same inputs always give the same answer.

use chrono::{DateTime, TimeDelta, Utc};

use crate::record::ReminderRecord;

/// What a tick should do with one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
  /// Nothing to do on this tick.
  Inert,
  /// The check is due and no notice has gone out yet.
  ToSend,
  /// The initial notice went out and another follow-up is owed.
  ToEscalate,
}

impl Classification {
  pub fn is_inert(self) -> bool { self == Self::Inert }
}

/// Classify `record` at instant `now`.
///
/// Rules, in order:
/// 1. a confirmed record is inert;
/// 2. an unsent record is due once `now` reaches `scheduled_at`;
/// 3. a sent record with escalation enabled and budget left is owed a
///    follow-up once `escalation_interval` has elapsed since the last notice;
/// 4. anything else is inert.
///
/// Rule 2 only applies before the first send and rule 3 only after it, so a
/// record can never be both due and owed a follow-up on the same tick.
pub fn classify(
  record: &ReminderRecord,
  now: DateTime<Utc>,
  escalation_interval: TimeDelta,
) -> Classification {
  if record.confirmed {
    return Classification::Inert;
  }

  if !record.sent {
    return if now >= record.scheduled_at {
      Classification::ToSend
    } else {
      Classification::Inert
    };
  }

  if record.escalation_enabled
    && record.escalations_sent < record.escalation_limit
  {
    // A sent record missing its timestamps is treated as sent at the epoch.
    let last = record.last_notice_at().unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    if now - last >= escalation_interval {
      return Classification::ToEscalate;
    }
  }

  Classification::Inert
}

//! Translation between stored documents and [`ReminderRecord`]s.
//!
//! Decoding never fails on a document that is an object: a missing or
//! mistyped field reads as its zero value (`""`, `0`, `false`, absent). One
//! malformed record therefore cannot poison a listing. Timestamps are epoch
//! milliseconds, accepted as JSON numbers or numeric strings.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use vigil_core::record::{ReminderRecord, Transition};

mod field {
  pub const TENANT_ID: &str = "tenantId";
  pub const SUBJECT_ID: &str = "subjectId";
  pub const SUBJECT_LABEL: &str = "subjectLabel";
  pub const DESCRIPTION: &str = "description";
  pub const SCHEDULED_AT: &str = "scheduledAt";
  pub const SENT: &str = "sent";
  pub const SENT_AT: &str = "sentAt";
  pub const ESCALATION_ENABLED: &str = "escalationEnabled";
  pub const ESCALATION_LIMIT: &str = "escalationLimit";
  pub const ESCALATIONS_SENT: &str = "escalationsSent";
  pub const LAST_ESCALATION_AT: &str = "lastEscalationAt";
  pub const CONFIRMED: &str = "confirmed";
  pub const CONFIRMED_AT: &str = "confirmedAt";
  pub const CREATED_BY: &str = "createdBy";
  pub const CREATED_BY_LABEL: &str = "createdByLabel";
  pub const CREATED_AT: &str = "createdAt";
  pub const UPDATED_AT: &str = "updatedAt";
}

// ─── Decoding ────────────────────────────────────────────────────────────────

/// Decode the document stored under `id`. The tenant comes from the path,
/// not the document. Returns `None` only if the document is not an object.
pub fn decode_record(tenant_id: &str, id: &str, doc: &Value) -> Option<ReminderRecord> {
  let doc = doc.as_object()?;
  Some(ReminderRecord {
    id:                 id.to_owned(),
    tenant_id:          tenant_id.to_owned(),
    subject_id:         read_string(doc, field::SUBJECT_ID),
    subject_label:      read_string(doc, field::SUBJECT_LABEL),
    description:        read_string(doc, field::DESCRIPTION),
    scheduled_at:       read_instant(doc, field::SCHEDULED_AT)
      .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
    sent:               read_bool(doc, field::SENT),
    sent_at:            read_instant(doc, field::SENT_AT),
    escalation_enabled: read_bool(doc, field::ESCALATION_ENABLED),
    escalation_limit:   read_count(doc, field::ESCALATION_LIMIT),
    escalations_sent:   read_count(doc, field::ESCALATIONS_SENT),
    last_escalation_at: read_instant(doc, field::LAST_ESCALATION_AT),
    confirmed:          read_bool(doc, field::CONFIRMED),
    confirmed_at:       read_instant(doc, field::CONFIRMED_AT),
    created_by:         read_string(doc, field::CREATED_BY),
    created_by_label:   read_string(doc, field::CREATED_BY_LABEL),
    created_at:         read_instant(doc, field::CREATED_AT),
    updated_at:         read_instant(doc, field::UPDATED_AT),
  })
}

pub fn read_string(doc: &Map<String, Value>, key: &str) -> String {
  match doc.get(key) {
    Some(Value::String(s)) => s.clone(),
    Some(Value::Number(n)) => n.to_string(),
    Some(Value::Bool(b)) => b.to_string(),
    _ => String::new(),
  }
}

fn read_bool(doc: &Map<String, Value>, key: &str) -> bool {
  match doc.get(key) {
    Some(Value::Bool(b)) => *b,
    Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
    _ => false,
  }
}

fn read_count(doc: &Map<String, Value>, key: &str) -> u32 {
  let raw = match doc.get(key) {
    Some(Value::Number(n)) => n
      .as_u64()
      .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
    Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
    _ => None,
  };
  raw.map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX))
}

fn read_instant(doc: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
  let millis = match doc.get(key)? {
    Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
    Value::String(s) => s.trim().parse::<i64>().ok(),
    _ => None,
  }?;
  DateTime::from_timestamp_millis(millis)
}

// ─── Encoding ────────────────────────────────────────────────────────────────

/// The full stored document for `record`. The id is the document's key and
/// is not repeated inside it.
pub fn encode_record(record: &ReminderRecord) -> Map<String, Value> {
  let mut doc = Map::new();
  doc.insert(field::TENANT_ID.into(), record.tenant_id.clone().into());
  doc.insert(field::SUBJECT_ID.into(), record.subject_id.clone().into());
  doc.insert(field::SUBJECT_LABEL.into(), record.subject_label.clone().into());
  doc.insert(field::DESCRIPTION.into(), record.description.clone().into());
  doc.insert(field::SCHEDULED_AT.into(), millis(record.scheduled_at));
  doc.insert(field::SENT.into(), record.sent.into());
  doc.insert(field::SENT_AT.into(), opt_millis(record.sent_at));
  doc.insert(field::ESCALATION_ENABLED.into(), record.escalation_enabled.into());
  doc.insert(field::ESCALATION_LIMIT.into(), record.escalation_limit.into());
  doc.insert(field::ESCALATIONS_SENT.into(), record.escalations_sent.into());
  doc.insert(field::LAST_ESCALATION_AT.into(), opt_millis(record.last_escalation_at));
  doc.insert(field::CONFIRMED.into(), record.confirmed.into());
  doc.insert(field::CONFIRMED_AT.into(), opt_millis(record.confirmed_at));
  doc.insert(field::CREATED_BY.into(), record.created_by.clone().into());
  doc.insert(field::CREATED_BY_LABEL.into(), record.created_by_label.clone().into());
  doc.insert(field::CREATED_AT.into(), opt_millis(record.created_at));
  doc.insert(field::UPDATED_AT.into(), opt_millis(record.updated_at));
  doc
}

/// Only the fields `transition` changes, ready for a partial update.
pub fn encode_transition(transition: &Transition) -> Map<String, Value> {
  let mut doc = Map::new();
  match *transition {
    Transition::Sent { at } => {
      doc.insert(field::SENT.into(), true.into());
      doc.insert(field::SENT_AT.into(), millis(at));
    }
    Transition::Escalated { count, at } => {
      doc.insert(field::ESCALATIONS_SENT.into(), count.into());
      doc.insert(field::LAST_ESCALATION_AT.into(), millis(at));
    }
    Transition::Confirmed { at } => {
      doc.insert(field::CONFIRMED.into(), true.into());
      doc.insert(field::CONFIRMED_AT.into(), millis(at));
      doc.insert(field::UPDATED_AT.into(), millis(at));
    }
  }
  doc
}

fn millis(at: DateTime<Utc>) -> Value { at.timestamp_millis().into() }

/// `None` encodes as null, which removes the field when written.
fn opt_millis(at: Option<DateTime<Utc>>) -> Value {
  at.map_or(Value::Null, millis)
}

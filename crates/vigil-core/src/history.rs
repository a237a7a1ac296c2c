//! Verification history — the append-only audit trail of confirmations.
//!
//! One entry is written per confirmation event and never modified or deleted
//! afterwards. Entries are stored as flat camelCase documents with epoch
//! millisecond timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A completed check, as recorded at the moment it was confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationEntry {
  /// The entry's key in the history collection; not stored in the document.
  #[serde(skip)]
  pub id:                 String,
  pub tenant_id:          String,
  pub subject_id:         String,
  #[serde(default)]
  pub subject_label:      String,
  #[serde(default)]
  pub description:        String,
  /// The record's scheduled time, copied at confirmation.
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub scheduled_at:       DateTime<Utc>,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub confirmed_at:       DateTime<Utc>,
  #[serde(default)]
  pub confirmed_by:       String,
  #[serde(default)]
  pub confirmed_by_label: String,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub created_at:         DateTime<Utc>,
}

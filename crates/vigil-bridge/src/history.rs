//! [`HistoryRepository`] — the append-only verification history.

use serde_json::Value;
use vigil_core::{Result, history::VerificationEntry, tree::DocumentTree};

use crate::{bridge::StoreBridge, layout};

pub struct HistoryRepository<T> {
  bridge: StoreBridge<T>,
}

impl<T> Clone for HistoryRepository<T> {
  fn clone(&self) -> Self {
    Self {
      bridge: self.bridge.clone(),
    }
  }
}

impl<T: DocumentTree> HistoryRepository<T> {
  pub fn new(bridge: StoreBridge<T>) -> Self { Self { bridge } }

  /// Store `entry` under a new key and return it with that key as its id.
  /// Entries are never rewritten afterwards.
  pub async fn append(&self, mut entry: VerificationEntry) -> Result<VerificationEntry> {
    entry.id = self.bridge.push_key();
    let path = layout::history(&entry.tenant_id)?.child(&entry.id)?;
    self.bridge.write(&path, serde_json::to_value(&entry)?).await?;
    Ok(entry)
  }

  /// All entries for `tenant`, oldest first. Undecodable entries are skipped.
  pub async fn list(&self, tenant: &str) -> Result<Vec<VerificationEntry>> {
    let path = layout::history(tenant)?;
    let Value::Object(docs) = self.bridge.read_collection(&path).await? else {
      return Ok(Vec::new());
    };

    Ok(
      docs
        .into_iter()
        .filter_map(|(id, doc)| {
          match serde_json::from_value::<VerificationEntry>(doc) {
            Ok(entry) => Some(VerificationEntry { id, ..entry }),
            Err(e) => {
              tracing::warn!(tenant, entry = %id, "skipping history entry: {e}");
              None
            }
          }
        })
        .collect(),
    )
  }
}

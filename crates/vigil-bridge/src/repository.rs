//! [`ReminderRepository`] — typed CRUD over the alert and reminder
//! collections of every tenant.

use chrono::Utc;
use serde_json::Value;
use vigil_core::{
  Error, Result,
  record::{RecordKind, ReminderRecord, Transition},
  tree::DocumentTree,
};

use crate::{
  bridge::StoreBridge,
  codec::{decode_record, encode_record, encode_transition},
  layout,
};

/// Reminder and alert records, partitioned by tenant.
pub struct ReminderRepository<T> {
  bridge: StoreBridge<T>,
}

impl<T> Clone for ReminderRepository<T> {
  fn clone(&self) -> Self {
    Self {
      bridge: self.bridge.clone(),
    }
  }
}

impl<T: DocumentTree> ReminderRepository<T> {
  pub fn new(bridge: StoreBridge<T>) -> Self { Self { bridge } }

  /// Ids of every tenant that has stored data, in key order. Only the keys
  /// are fetched, never the tenants' contents.
  pub async fn list_tenants(&self) -> Result<Vec<String>> {
    self.bridge.read_keys(&layout::tenants()?).await
  }

  /// Every record of `kind` belonging to `tenant`, in key order. A tenant
  /// with no collection yields an empty list. Documents that are not objects
  /// are logged and skipped.
  pub async fn list(
    &self,
    tenant: &str,
    kind: RecordKind,
  ) -> Result<Vec<ReminderRecord>> {
    let path = layout::collection(tenant, kind)?;
    let Value::Object(docs) = self.bridge.read_collection(&path).await? else {
      return Ok(Vec::new());
    };

    let mut records = Vec::with_capacity(docs.len());
    for (id, doc) in &docs {
      match decode_record(tenant, id, doc) {
        Some(record) => records.push(record),
        None => tracing::warn!(
          tenant, %kind, record = %id,
          "skipping malformed record document"
        ),
      }
    }
    Ok(records)
  }

  /// A single record, or [`Error::NotFound`] if it no longer exists.
  pub async fn get(
    &self,
    tenant: &str,
    kind: RecordKind,
    id: &str,
  ) -> Result<ReminderRecord> {
    let path = layout::record(tenant, kind, id)?;
    let doc = self.bridge.read_subtree(&path).await?;
    decode_record(tenant, id, &doc).ok_or_else(|| not_found(tenant, kind, id))
  }

  /// Store `record` under a freshly generated key and return it with its id.
  /// The creation and update stamps default to now.
  pub async fn create(
    &self,
    kind: RecordKind,
    mut record: ReminderRecord,
  ) -> Result<ReminderRecord> {
    let now = Utc::now();
    record.id = self.bridge.push_key();
    record.created_at.get_or_insert(now);
    record.updated_at.get_or_insert(now);

    let path = layout::record(&record.tenant_id, kind, &record.id)?;
    self
      .bridge
      .write(&path, Value::Object(encode_record(&record)))
      .await?;
    tracing::debug!(tenant = %record.tenant_id, %kind, record = %record.id, "record created");
    Ok(record)
  }

  /// Replace every stored field of an existing record with `record`'s.
  pub async fn update(&self, kind: RecordKind, record: &ReminderRecord) -> Result<()> {
    let path = layout::record(&record.tenant_id, kind, &record.id)?;
    if self.bridge.read_subtree(&path).await?.is_null() {
      return Err(not_found(&record.tenant_id, kind, &record.id));
    }

    let mut updated = record.clone();
    updated.updated_at = Some(Utc::now());
    self.bridge.write(&path, Value::Object(encode_record(&updated))).await
  }

  /// Persist exactly the fields `transition` changes. A record that no
  /// longer exists is [`Error::NotFound`] and nothing is written, so a
  /// deleted record is never brought back as a partial document.
  pub async fn apply(
    &self,
    tenant: &str,
    kind: RecordKind,
    id: &str,
    transition: &Transition,
  ) -> Result<()> {
    let path = layout::record(tenant, kind, id)?;
    if self.bridge.read_subtree(&path).await?.is_null() {
      return Err(not_found(tenant, kind, id));
    }
    self.bridge.update(&path, encode_transition(transition)).await
  }

  pub async fn delete(&self, tenant: &str, kind: RecordKind, id: &str) -> Result<()> {
    let path = layout::record(tenant, kind, id)?;
    self.bridge.remove(&path).await
  }
}

fn not_found(tenant: &str, kind: RecordKind, id: &str) -> Error {
  Error::NotFound {
    kind,
    tenant: tenant.to_owned(),
    id: id.to_owned(),
  }
}

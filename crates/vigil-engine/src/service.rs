//! [`ReminderService`] — authoring and confirming records.
//!
//! The scheduler only ever moves records forward through sent and escalated.
//! Everything else that happens to a record (creation, confirmation) comes
//! through here.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use vigil_bridge::{HistoryRepository, ReminderRepository};
use vigil_core::{
  Error, Result,
  directory::{Directory, MachineDirectory},
  history::VerificationEntry,
  record::{RecordKind, ReminderRecord, Transition},
  tree::DocumentTree,
};

/// What an author supplies for a new record. Labels are looked up, not
/// trusted from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReminder {
  pub tenant_id:          String,
  pub machine_id:         String,
  pub description:        String,
  pub scheduled_at:       DateTime<Utc>,
  pub escalation_enabled: bool,
  pub escalation_limit:   u32,
  pub created_by:         String,
}

pub struct ReminderService<T, D, MD> {
  records:  ReminderRepository<T>,
  history:  HistoryRepository<T>,
  accounts: Arc<D>,
  machines: Arc<MD>,
}

impl<T, D, MD> Clone for ReminderService<T, D, MD> {
  fn clone(&self) -> Self {
    Self {
      records:  self.records.clone(),
      history:  self.history.clone(),
      accounts: Arc::clone(&self.accounts),
      machines: Arc::clone(&self.machines),
    }
  }
}

impl<T, D, MD> ReminderService<T, D, MD>
where
  T: DocumentTree,
  D: Directory,
  MD: MachineDirectory,
{
  pub fn new(
    records: ReminderRepository<T>,
    history: HistoryRepository<T>,
    accounts: Arc<D>,
    machines: Arc<MD>,
  ) -> Self {
    Self {
      records,
      history,
      accounts,
      machines,
    }
  }

  /// Store a new pending record of `kind`, denormalising the machine label
  /// and the author's display name onto it.
  pub async fn create(&self, kind: RecordKind, new: NewReminder) -> Result<ReminderRecord> {
    let machine = self
      .machines
      .get_machine(&new.tenant_id, &new.machine_id)
      .await?
      .ok_or_else(|| Error::MachineNotFound {
        tenant:  new.tenant_id.clone(),
        machine: new.machine_id.clone(),
      })?;
    let created_by_label = self.display_label(&new.created_by).await;

    let mut record = ReminderRecord::pending(new.tenant_id, new.machine_id, new.scheduled_at);
    record.subject_label = machine.label;
    record.description = new.description;
    record.escalation_enabled = new.escalation_enabled;
    record.escalation_limit = if new.escalation_enabled {
      new.escalation_limit
    } else {
      0
    };
    record.created_by = new.created_by;
    record.created_by_label = created_by_label;

    let record = self.records.create(kind, record).await?;
    tracing::info!(
      tenant = %record.tenant_id, %kind, record = %record.id,
      scheduled_at = %record.scheduled_at,
      "record created"
    );
    Ok(record)
  }

  /// Mark a record as checked and write its history entry. A record can be
  /// confirmed only once.
  pub async fn confirm(
    &self,
    tenant: &str,
    kind: RecordKind,
    id: &str,
    confirmed_by: &str,
    at: DateTime<Utc>,
  ) -> Result<VerificationEntry> {
    let record = self.records.get(tenant, kind, id).await?;
    if record.confirmed {
      return Err(Error::AlreadyConfirmed {
        kind,
        id: id.to_owned(),
      });
    }

    self
      .records
      .apply(tenant, kind, id, &Transition::Confirmed { at })
      .await?;

    let entry = VerificationEntry {
      id:                 String::new(),
      tenant_id:          tenant.to_owned(),
      subject_id:         record.subject_id,
      subject_label:      record.subject_label,
      description:        record.description,
      scheduled_at:       record.scheduled_at,
      confirmed_at:       at,
      confirmed_by:       confirmed_by.to_owned(),
      confirmed_by_label: self.display_label(confirmed_by).await,
      created_at:         at,
    };
    let entry = self.history.append(entry).await?;
    tracing::info!(tenant, %kind, record = id, entry = %entry.id, "record confirmed");
    Ok(entry)
  }

  /// Records still awaiting confirmation.
  pub async fn list_active(&self, tenant: &str, kind: RecordKind) -> Result<Vec<ReminderRecord>> {
    let mut records = self.records.list(tenant, kind).await?;
    records.retain(|r| !r.confirmed);
    Ok(records)
  }

  /// Confirmed records, most recently confirmed first.
  pub async fn list_confirmed(
    &self,
    tenant: &str,
    kind: RecordKind,
  ) -> Result<Vec<ReminderRecord>> {
    let mut records = self.records.list(tenant, kind).await?;
    records.retain(|r| r.confirmed);
    records.sort_by(|a, b| b.confirmed_at.cmp(&a.confirmed_at));
    Ok(records)
  }

  /// The tenant's verification history, oldest first.
  pub async fn history(&self, tenant: &str) -> Result<Vec<VerificationEntry>> {
    self.history.list(tenant).await
  }

  /// `"First Last"` for an account, or empty if it cannot be found.
  async fn display_label(&self, account_id: &str) -> String {
    if account_id.is_empty() {
      return String::new();
    }
    match self.accounts.get_account(account_id).await {
      Ok(Some(account)) => account.display_name(),
      Ok(None) => String::new(),
      Err(e) => {
        tracing::debug!(account = account_id, error = %e, "account label lookup failed");
        String::new()
      }
    }
  }
}

//! [`Dispatcher`] — resolves who gets told and hands one message to the mail
//! transport. It never retries; the scheduler's next tick is the retry.

use std::sync::Arc;

use vigil_core::{
  Error, Result,
  directory::{Directory, MailTransport, OutgoingMail},
  record::{RecordKind, ReminderRecord},
};

/// Scheduled times are rendered in UTC as `dd/mm/YYYY HH:MM`.
const DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Which notice a message is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
  /// The first message, sent once the scheduled time has passed.
  Initial,
  /// Follow-up `number` of `limit`.
  FollowUp { number: u32, limit: u32 },
}

impl Notice {
  /// The follow-up owed next for `record`.
  pub fn next_follow_up(record: &ReminderRecord) -> Self {
    Self::FollowUp {
      number: record.escalations_sent.saturating_add(1),
      limit:  record.escalation_limit,
    }
  }

  pub fn is_follow_up(self) -> bool { matches!(self, Self::FollowUp { .. }) }
}

// ─── Dispatcher ──────────────────────────────────────────────────────────────

pub struct Dispatcher<D, M> {
  directory:          Arc<D>,
  mail:               Arc<M>,
  administrator_role: String,
}

impl<D, M> Clone for Dispatcher<D, M> {
  fn clone(&self) -> Self {
    Self {
      directory:          Arc::clone(&self.directory),
      mail:               Arc::clone(&self.mail),
      administrator_role: self.administrator_role.clone(),
    }
  }
}

impl<D: Directory, M: MailTransport> Dispatcher<D, M> {
  pub fn new(
    directory: Arc<D>,
    mail: Arc<M>,
    administrator_role: impl Into<String>,
  ) -> Self {
    Self {
      directory,
      mail,
      administrator_role: administrator_role.into(),
    }
  }

  /// The email of the first account, in directory order, that holds the
  /// administrator role and has an address.
  pub async fn resolve_recipient(&self) -> Result<String> {
    self
      .directory
      .list_accounts()
      .await?
      .into_iter()
      .find(|a| a.has_role(&self.administrator_role) && a.has_email())
      .map(|a| a.email.trim().to_owned())
      .ok_or(Error::NoAdministratorFound)
  }

  /// Format and send one notice about `record` to `to`.
  pub async fn dispatch(
    &self,
    to: &str,
    kind: RecordKind,
    record: &ReminderRecord,
    notice: Notice,
  ) -> Result<()> {
    let mail = compose(to, kind, record, notice);
    self.mail.send(&mail).await?;
    tracing::debug!(
      tenant = %record.tenant_id, %kind, record = %record.id, to,
      subject = %mail.subject,
      "notice handed to transport"
    );
    Ok(())
  }
}

// ─── Formatting ──────────────────────────────────────────────────────────────

/// Build the message for one notice.
pub fn compose(
  to: &str,
  kind: RecordKind,
  record: &ReminderRecord,
  notice: Notice,
) -> OutgoingMail {
  let label = match record.subject_label.trim() {
    "" => "Unknown machine",
    label => label,
  };
  let description = match record.description.trim() {
    "" => "No description",
    description => description,
  };

  let mut subject = format!("{} for machine check - {label}", kind.title());
  if notice.is_follow_up() {
    subject.insert_str(0, "FOLLOW-UP - ");
  }

  let opening = match notice {
    Notice::Initial => format!("A machine check {kind} is due."),
    Notice::FollowUp { number, limit } => format!(
      "This is follow-up {number}/{limit} for a machine check {kind} that \
       has not been confirmed."
    ),
  };
  let mut body = format!(
    "Hello,\n\n{opening}\n\nDetails:\n- Machine: {label}\n- Scheduled check: \
     {}\n- Description: {description}\n\n",
    record.scheduled_at.format(DATE_FORMAT),
  );
  if notice.is_follow_up() {
    body.push_str("The check has not been carried out yet. ");
  }
  body.push_str("Please carry out the check on this machine.\n\nRegards,\nMaintenance system\n");

  OutgoingMail {
    to: to.to_owned(),
    subject,
    body,
  }
}

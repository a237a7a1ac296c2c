//! Collaborator interfaces the engine consumes but does not own: the account
//! directory, the machine directory and the mail transport.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::Result;

// ─── Accounts ────────────────────────────────────────────────────────────────

/// A user account as seen by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
  pub id:         String,
  pub role:       String,
  pub email:      String,
  pub first_name: String,
  pub last_name:  String,
}

impl Account {
  /// `"First Last"`, skipping whichever half is blank.
  pub fn display_name(&self) -> String {
    [self.first_name.trim(), self.last_name.trim()]
      .into_iter()
      .filter(|part| !part.is_empty())
      .collect::<Vec<_>>()
      .join(" ")
  }

  /// Role comparison ignores ASCII case.
  pub fn has_role(&self, role: &str) -> bool {
    self.role.trim().eq_ignore_ascii_case(role)
  }

  pub fn has_email(&self) -> bool { !self.email.trim().is_empty() }
}

/// Read access to user accounts.
pub trait Directory: Send + Sync {
  /// All accounts, in the directory's listing order.
  fn list_accounts(
    &self,
  ) -> impl Future<Output = Result<Vec<Account>>> + Send + '_;

  /// A single account, or `None` if the id is unknown.
  fn get_account<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Account>>> + Send + 'a;
}

// ─── Machines ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
  pub id:    String,
  pub label: String,
}

/// Lookup of the machines a tenant owns. Used only when authoring a record,
/// to denormalise the machine label onto it.
pub trait MachineDirectory: Send + Sync {
  fn get_machine<'a>(
    &'a self,
    tenant_id: &'a str,
    machine_id: &'a str,
  ) -> impl Future<Output = Result<Option<Machine>>> + Send + 'a;
}

// ─── Mail ────────────────────────────────────────────────────────────────────

/// A fully formatted plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
  pub to:      String,
  pub subject: String,
  pub body:    String,
}

/// Hands one message to the mail system. Any error is reported as
/// [`Error::Transport`](crate::Error::Transport).
pub trait MailTransport: Send + Sync {
  fn send<'a>(
    &'a self,
    mail: &'a OutgoingMail,
  ) -> impl Future<Output = Result<()>> + Send + 'a;
}

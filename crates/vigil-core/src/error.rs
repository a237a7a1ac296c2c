//! Error taxonomy shared by every Vigil crate.

use std::time::Duration;

use thiserror::Error;

use crate::record::RecordKind;

#[derive(Debug, Error)]
pub enum Error {
  /// The store did not answer before the operation's deadline.
  #[error("{op} on {path} timed out after {after:?}")]
  Timeout {
    op:    &'static str,
    path:  String,
    after: Duration,
  },

  /// The store answered with a failure of its own.
  #[error("store error on {path}: {message}")]
  Store { path: String, message: String },

  #[error("{kind} {id} not found in tenant {tenant}")]
  NotFound {
    kind:   RecordKind,
    tenant: String,
    id:     String,
  },

  #[error("machine {machine} not found in tenant {tenant}")]
  MachineNotFound { tenant: String, machine: String },

  #[error("no administrator account with an email address")]
  NoAdministratorFound,

  #[error("mail transport error: {0}")]
  Transport(String),

  #[error("{kind} {id} is already confirmed")]
  AlreadyConfirmed { kind: RecordKind, id: String },

  #[error("invalid tree path: {0:?}")]
  InvalidPath(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Whether the failure is expected to clear on its own, so the scheduler
  /// simply tries again on its next tick.
  pub fn is_transient(&self) -> bool {
    matches!(
      self,
      Self::Timeout { .. } | Self::Store { .. } | Self::Transport(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

//! Error type for `vigil-server`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("smtp error: {0}")]
  Smtp(#[from] lettre::transport::smtp::Error),

  #[error("invalid mailbox: {0}")]
  Address(#[from] lettre::address::AddressError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

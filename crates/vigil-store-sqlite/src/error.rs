//! Error type for `vigil-store-sqlite`.

use thiserror::Error;
use vigil_core::tree::TreeFault;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] vigil_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Listeners only see the message.
impl From<Error> for TreeFault {
  fn from(err: Error) -> Self { TreeFault::new(err.to_string()) }
}

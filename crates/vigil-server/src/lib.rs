//! Host process for the Vigil engine.
//!
//! Holds the deserialised [`ServerConfig`] and the concrete mail transports
//! the binary wires into the scheduler.

pub mod error;
pub mod mail;

pub use error::Error;

use std::path::PathBuf;

use serde::Deserialize;
use vigil_engine::EngineConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `vigil.toml` and `VIGIL__*`
/// environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  #[serde(default)]
  pub engine:     EngineConfig,
  /// Without this section mail is only logged.
  #[serde(default)]
  pub smtp:       Option<SmtpConfig>,
}

fn default_store_path() -> PathBuf { PathBuf::from("vigil.db") }

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
  pub host:     String,
  #[serde(default = "default_smtp_port")]
  pub port:     u16,
  #[serde(default)]
  pub username: String,
  #[serde(default)]
  pub password: String,
  /// Sender mailbox, e.g. `Maintenance <maintenance@example.com>`.
  pub from:     String,
}

fn default_smtp_port() -> u16 { 587 }

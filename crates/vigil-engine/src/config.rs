//! Engine configuration, deserialised from the `[engine]` section of the
//! host's configuration file.

use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use vigil_bridge::Deadlines;
use vigil_core::record::RecordKind;

/// Role an account must hold to receive notifications.
pub const DEFAULT_ADMINISTRATOR_ROLE: &str = "superadmin";

// ─── Engine ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
  #[serde(default = "KindSchedule::reminders")]
  pub reminders:          KindSchedule,
  #[serde(default = "KindSchedule::alerts")]
  pub alerts:             KindSchedule,
  #[serde(default)]
  pub deadlines:          DeadlineConfig,
  #[serde(default = "default_administrator_role")]
  pub administrator_role: String,
}

fn default_administrator_role() -> String { DEFAULT_ADMINISTRATOR_ROLE.to_owned() }

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      reminders:          KindSchedule::reminders(),
      alerts:             KindSchedule::alerts(),
      deadlines:          DeadlineConfig::default(),
      administrator_role: default_administrator_role(),
    }
  }
}

impl EngineConfig {
  pub fn schedule(&self, kind: RecordKind) -> &KindSchedule {
    match kind {
      RecordKind::Alert => &self.alerts,
      RecordKind::Reminder => &self.reminders,
    }
  }
}

// ─── Per-kind cadence ────────────────────────────────────────────────────────

/// Timer settings for one record kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindSchedule {
  /// Seconds between ticks.
  pub tick_secs:                u64,
  /// Seconds to wait after startup before the first tick.
  #[serde(default)]
  pub initial_delay_secs:       u64,
  /// Minimum seconds between two notices for the same record. Defaults to
  /// the tick period.
  #[serde(default)]
  pub escalation_interval_secs: Option<u64>,
}

impl KindSchedule {
  /// Every five minutes, starting one minute after launch.
  pub fn reminders() -> Self {
    Self {
      tick_secs:                300,
      initial_delay_secs:       60,
      escalation_interval_secs: Some(300),
    }
  }

  /// Hourly, starting immediately.
  pub fn alerts() -> Self {
    Self {
      tick_secs:                3600,
      initial_delay_secs:       0,
      escalation_interval_secs: Some(3600),
    }
  }

  /// Never zero; a zero period would spin.
  pub fn tick(&self) -> Duration { Duration::from_secs(self.tick_secs.max(1)) }

  pub fn initial_delay(&self) -> Duration {
    Duration::from_secs(self.initial_delay_secs)
  }

  pub fn escalation_interval(&self) -> TimeDelta {
    let secs = self.escalation_interval_secs.unwrap_or(self.tick_secs);
    i64::try_from(secs)
      .ok()
      .and_then(TimeDelta::try_seconds)
      .unwrap_or(TimeDelta::MAX)
  }
}

// ─── Deadlines ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadlineConfig {
  pub read_secs:  u64,
  pub list_secs:  u64,
  pub write_secs: u64,
}

impl Default for DeadlineConfig {
  fn default() -> Self {
    Self {
      read_secs:  10,
      list_secs:  15,
      write_secs: 10,
    }
  }
}

impl From<&DeadlineConfig> for Deadlines {
  fn from(config: &DeadlineConfig) -> Self {
    Self {
      read:  Duration::from_secs(config.read_secs),
      list:  Duration::from_secs(config.list_secs),
      write: Duration::from_secs(config.write_secs),
    }
  }
}

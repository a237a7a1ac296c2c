//! The Vigil notification engine.
//!
//! A [`Scheduler`] runs one timer per [`RecordKind`](vigil_core::record::RecordKind).
//! Each tick lists every tenant's records, asks the selector what is owed,
//! hands the message to the [`Dispatcher`], and only then persists the
//! transition. [`ReminderService`] covers the authoring side: creating
//! records and confirming that a check was done.

pub mod config;
pub mod dispatch;
pub mod scheduler;
pub mod service;

pub use config::{DeadlineConfig, EngineConfig, KindSchedule};
pub use dispatch::{Dispatcher, Notice};
pub use scheduler::{Scheduler, TickReport};
pub use service::{NewReminder, ReminderService};

#[cfg(test)]
mod tests;

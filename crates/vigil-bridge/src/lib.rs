//! Deadline-bounded access to a Vigil document tree.
//!
//! [`StoreBridge`] wraps any [`DocumentTree`](vigil_core::tree::DocumentTree)
//! and turns its listener callbacks into ordinary `async` calls that either
//! resolve or fail with [`Error::Timeout`](vigil_core::Error::Timeout). The
//! typed repositories for reminder records, verification history and the
//! account/machine directory are all built on top of it.

mod codec;
mod layout;

pub mod bridge;
pub mod directory;
pub mod history;
pub mod memory;
pub mod repository;

pub use bridge::{Deadlines, StoreBridge};
pub use directory::TreeDirectory;
pub use history::HistoryRepository;
pub use memory::MemoryTree;
pub use repository::ReminderRepository;

//! SQLite backend for the Vigil document tree.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Results are handed to the tree's
//! listeners from spawned tasks, never inline.

mod encode;
mod schema;
mod tree;

pub mod error;

pub use error::{Error, Result};
pub use tree::SqliteTree;

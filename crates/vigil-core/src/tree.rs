//! The `DocumentTree` trait — a push-based key/value document tree.
//!
//! Backends deliver every outcome through a callback: a read hands a snapshot
//! to a one-shot listener, a write reports through a completion listener.
//! Callbacks may run on any thread, fire at most once, and may arrive late
//! or never. The `vigil-bridge` crate turns this into deadline-bounded
//! request/response calls; nothing else should call a tree directly.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::path::TreePath;

/// The JSON value found at a path. An absent node reads as `Value::Null`.
pub type Snapshot = Value;

/// A failure reported by the tree itself (permission denied, disconnected,
/// backend error). Carries only the backend's message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TreeFault {
  pub message: String,
}

impl TreeFault {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}

/// Receives the single snapshot produced by [`DocumentTree::read_once`].
pub type ValueListener = Box<dyn FnOnce(Result<Snapshot, TreeFault>) + Send>;

/// Receives the child keys produced by [`DocumentTree::read_keys_once`].
pub type KeysListener = Box<dyn FnOnce(Result<Vec<String>, TreeFault>) + Send>;

/// Receives the outcome of a write.
pub type CompletionListener = Box<dyn FnOnce(Result<(), TreeFault>) + Send>;

/// Abstraction over a callback-driven document tree backend.
///
/// Writing `Value::Null` anywhere removes that node; parents left without
/// children disappear with it.
pub trait DocumentTree: Send + Sync + 'static {
  /// Register a one-shot listener for the subtree at `path`.
  fn read_once(&self, path: &TreePath, listener: ValueListener);

  /// Register a one-shot listener for the child keys of `path`, in key
  /// order, without their values. A scalar or absent node has no keys.
  ///
  /// The default reads the whole subtree; backends that can answer from
  /// an index should override it.
  fn read_keys_once(&self, path: &TreePath, listener: KeysListener) {
    self.read_once(path, Box::new(move |outcome| listener(outcome.map(child_keys))));
  }

  /// Replace the subtree at `path` with `value`.
  fn set_value(
    &self,
    path: &TreePath,
    value: Snapshot,
    on_complete: CompletionListener,
  );

  /// Replace only the named children of `path`, leaving siblings intact.
  fn update_children(
    &self,
    path: &TreePath,
    children: Map<String, Value>,
    on_complete: CompletionListener,
  );

  /// Remove the subtree at `path`.
  fn remove_value(&self, path: &TreePath, on_complete: CompletionListener) {
    self.set_value(path, Value::Null, on_complete);
  }

  /// Generate a fresh child key locally. Keys sort in creation order.
  fn push_key(&self) -> String;
}

/// The keys of an object snapshot, or none for anything else.
pub fn child_keys(snapshot: Snapshot) -> Vec<String> {
  match snapshot {
    Value::Object(children) => children.into_iter().map(|(key, _)| key).collect(),
    _ => Vec::new(),
  }
}

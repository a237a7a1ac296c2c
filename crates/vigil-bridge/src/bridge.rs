//! [`StoreBridge`] — request/response calls over a callback-driven tree.
//!
//! Every call registers exactly one listener wired to its own oneshot
//! channel, then waits on that channel under the operation's deadline. When
//! the deadline passes the receiver is dropped; a callback that fires later
//! finds the channel closed and its result is discarded. No call retries.

use std::{sync::Arc, time::Duration};

use serde_json::{Map, Value};
use tokio::sync::oneshot;
use vigil_core::{
  Error, Result,
  path::TreePath,
  tree::{DocumentTree, Snapshot, TreeFault},
};

// ─── Deadlines ───────────────────────────────────────────────────────────────

/// Per-operation deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadlines {
  /// Single-document reads.
  pub read:  Duration,
  /// Whole-collection reads, which can return many documents.
  pub list:  Duration,
  /// Sets, updates and removals.
  pub write: Duration,
}

impl Default for Deadlines {
  fn default() -> Self {
    Self {
      read:  Duration::from_secs(10),
      list:  Duration::from_secs(15),
      write: Duration::from_secs(10),
    }
  }
}

// ─── Bridge ──────────────────────────────────────────────────────────────────

/// Blocking-style access to a [`DocumentTree`].
///
/// Cloning is cheap: the tree handle is shared and holds no per-call state.
pub struct StoreBridge<T> {
  tree:      Arc<T>,
  deadlines: Deadlines,
}

impl<T> Clone for StoreBridge<T> {
  fn clone(&self) -> Self {
    Self {
      tree:      Arc::clone(&self.tree),
      deadlines: self.deadlines,
    }
  }
}

impl<T: DocumentTree> StoreBridge<T> {
  pub fn new(tree: Arc<T>, deadlines: Deadlines) -> Self {
    Self { tree, deadlines }
  }

  /// Read the subtree at `path` under the single-document deadline.
  /// An absent node reads as `Value::Null`.
  pub async fn read_subtree(&self, path: &TreePath) -> Result<Snapshot> {
    self.read_with("read", path, self.deadlines.read).await
  }

  /// Read a whole collection under the (longer) listing deadline.
  pub async fn read_collection(&self, path: &TreePath) -> Result<Snapshot> {
    self.read_with("list", path, self.deadlines.list).await
  }

  /// The child keys of `path` under the listing deadline, without reading
  /// what lies below them.
  pub async fn read_keys(&self, path: &TreePath) -> Result<Vec<String>> {
    let tree = Arc::clone(&self.tree);
    let target = path.clone();
    await_callback("keys", path, self.deadlines.list, move |listener| {
      tree.read_keys_once(&target, listener)
    })
    .await
  }

  /// Replace the subtree at `path`.
  pub async fn write(&self, path: &TreePath, value: Value) -> Result<()> {
    let tree = Arc::clone(&self.tree);
    let target = path.clone();
    await_callback("write", path, self.deadlines.write, move |listener| {
      tree.set_value(&target, value, listener)
    })
    .await
  }

  /// Replace only the given children of `path`.
  pub async fn update(
    &self,
    path: &TreePath,
    children: Map<String, Value>,
  ) -> Result<()> {
    let tree = Arc::clone(&self.tree);
    let target = path.clone();
    await_callback("update", path, self.deadlines.write, move |listener| {
      tree.update_children(&target, children, listener)
    })
    .await
  }

  /// Remove the subtree at `path`.
  pub async fn remove(&self, path: &TreePath) -> Result<()> {
    let tree = Arc::clone(&self.tree);
    let target = path.clone();
    await_callback("remove", path, self.deadlines.write, move |listener| {
      tree.remove_value(&target, listener)
    })
    .await
  }

  /// A fresh child key, generated without a round trip.
  pub fn push_key(&self) -> String { self.tree.push_key() }

  async fn read_with(
    &self,
    op: &'static str,
    path: &TreePath,
    deadline: Duration,
  ) -> Result<Snapshot> {
    let tree = Arc::clone(&self.tree);
    let target = path.clone();
    await_callback(op, path, deadline, move |listener| {
      tree.read_once(&target, listener)
    })
    .await
  }
}

/// Hand a fresh one-shot listener to `register` and wait for it to fire.
async fn await_callback<R, F>(
  op: &'static str,
  path: &TreePath,
  deadline: Duration,
  register: F,
) -> Result<R>
where
  R: Send + 'static,
  F: FnOnce(Box<dyn FnOnce(Result<R, TreeFault>) + Send>) + Send,
{
  let (tx, rx) = oneshot::channel();
  let label = path.to_string();

  register(Box::new(move |outcome| {
    if tx.send(outcome).is_err() {
      tracing::debug!(op, path = %label, "discarding late store callback");
    }
  }));

  match tokio::time::timeout(deadline, rx).await {
    Ok(Ok(Ok(value))) => Ok(value),
    Ok(Ok(Err(fault))) => Err(Error::Store {
      path:    path.to_string(),
      message: fault.message,
    }),
    // The backend dropped the listener without ever calling it.
    Ok(Err(_)) => Err(Error::Store {
      path:    path.to_string(),
      message: format!("{op} listener dropped without a result"),
    }),
    Err(_) => Err(Error::Timeout {
      op,
      path: path.to_string(),
      after: deadline,
    }),
  }
}

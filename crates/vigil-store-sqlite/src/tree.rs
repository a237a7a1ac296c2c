//! [`SqliteTree`] — the SQLite implementation of [`DocumentTree`].

use std::{future::Future, path::Path};

use serde_json::{Map, Value};
use tokio::runtime::Handle;
use uuid::Uuid;
use vigil_core::{
  path::TreePath,
  tree::{CompletionListener, DocumentTree, KeysListener, TreeFault, ValueListener},
};

use crate::{
  Result,
  encode::{Leaf, ancestors, descendant_bounds, flatten, subtree_bounds, unflatten},
  schema::{
    DELETE_ALL, DELETE_NODE, DELETE_SUBTREE, INSERT_LEAF, SCHEMA, SELECT_ALL,
    SELECT_CHILD_KEYS, SELECT_SUBTREE,
  },
};

// ─── Tree ────────────────────────────────────────────────────────────────────

/// A document tree backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteTree {
  conn:    tokio_rusqlite::Connection,
  runtime: Handle,
}

impl SqliteTree {
  /// Open (or create) a tree at `path` and run schema initialisation.
  /// Callbacks run on the runtime this is called from.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory tree — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self {
      conn,
      runtime: Handle::current(),
    })
  }

  /// Read the subtree at `path` directly.
  pub async fn read(&self, path: &TreePath) -> Result<Value> {
    let base = path.clone();
    let rows = self
      .conn
      .call(move |conn| {
        let mut rows = Vec::new();
        if base.is_root() {
          let mut stmt = conn.prepare(SELECT_ALL)?;
          let mapped = stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?;
          for row in mapped {
            rows.push(row?);
          }
        } else {
          let (exact, lower, upper) = subtree_bounds(&base);
          let mut stmt = conn.prepare(SELECT_SUBTREE)?;
          let mapped = stmt.query_map(
            rusqlite::params![exact, lower, upper],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )?;
          for row in mapped {
            rows.push(row?);
          }
        }
        Ok::<Vec<Leaf>, tokio_rusqlite::Error>(rows)
      })
      .await?;
    unflatten(path, rows)
  }

  /// The child keys of `path`, answered from the path index alone.
  pub async fn keys(&self, path: &TreePath) -> Result<Vec<String>> {
    let (lower, upper) = descendant_bounds(path);
    let start = i64::try_from(lower.chars().count() + 1).unwrap_or(i64::MAX);
    let keys = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(SELECT_CHILD_KEYS)?;
        let mapped = stmt.query_map(
          rusqlite::params![lower, upper, start],
          |r| r.get::<_, String>(0),
        )?;
        let mut keys = Vec::new();
        for key in mapped {
          keys.push(key?);
        }
        Ok::<Vec<String>, tokio_rusqlite::Error>(keys)
      })
      .await?;
    Ok(keys)
  }

  /// Replace each `(path, value)` pair in turn, all in one transaction.
  pub async fn write_all(&self, writes: Vec<(TreePath, Value)>) -> Result<()> {
    let mut plan = Vec::with_capacity(writes.len());
    for (path, value) in writes {
      let leaves = flatten(&path, &value)?;
      plan.push((path, leaves));
    }

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for (path, leaves) in &plan {
          replace_subtree(&tx, path, leaves)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `op` on the runtime and hand its outcome to `deliver`.
  fn dispatch<R, F, D>(&self, op: F, deliver: D)
  where
    R: Send + 'static,
    F: Future<Output = Result<R>> + Send + 'static,
    D: FnOnce(Result<R, TreeFault>) + Send + 'static,
  {
    self.runtime.spawn(async move {
      let outcome = op.await.map_err(|e| {
        tracing::warn!(error = %e, "sqlite tree operation failed");
        TreeFault::from(e)
      });
      deliver(outcome);
    });
  }
}

/// Drop everything at and below `path`, and any scalar stored at one of its
/// ancestors, then insert the new leaves.
fn replace_subtree(
  tx: &rusqlite::Transaction<'_>,
  path: &TreePath,
  leaves: &[Leaf],
) -> rusqlite::Result<()> {
  if path.is_root() {
    tx.execute(DELETE_ALL, [])?;
  } else {
    let (exact, lower, upper) = subtree_bounds(path);
    tx.execute(DELETE_SUBTREE, rusqlite::params![exact, lower, upper])?;
    if !leaves.is_empty() {
      for ancestor in ancestors(path) {
        tx.execute(DELETE_NODE, rusqlite::params![ancestor])?;
      }
    }
  }

  let mut insert = tx.prepare_cached(INSERT_LEAF)?;
  for (leaf_path, json) in leaves {
    insert.execute(rusqlite::params![leaf_path, json])?;
  }
  Ok(())
}

// ─── DocumentTree impl ───────────────────────────────────────────────────────

impl DocumentTree for SqliteTree {
  fn read_once(&self, path: &TreePath, listener: ValueListener) {
    let tree = self.clone();
    let path = path.clone();
    self.dispatch(async move { tree.read(&path).await }, listener);
  }

  fn read_keys_once(&self, path: &TreePath, listener: KeysListener) {
    let tree = self.clone();
    let path = path.clone();
    self.dispatch(async move { tree.keys(&path).await }, listener);
  }

  fn set_value(
    &self,
    path: &TreePath,
    value: Value,
    on_complete: CompletionListener,
  ) {
    let tree = self.clone();
    let writes = vec![(path.clone(), value)];
    self.dispatch(async move { tree.write_all(writes).await }, on_complete);
  }

  fn update_children(
    &self,
    path: &TreePath,
    children: Map<String, Value>,
    on_complete: CompletionListener,
  ) {
    let tree = self.clone();
    let base = path.clone();
    self.dispatch(
      async move {
        // Every key must be valid before anything is written.
        let mut writes = Vec::with_capacity(children.len());
        for (key, value) in children {
          writes.push((base.child(&key)?, value));
        }
        tree.write_all(writes).await
      },
      on_complete,
    );
  }

  fn push_key(&self) -> String { Uuid::now_v7().simple().to_string() }
}

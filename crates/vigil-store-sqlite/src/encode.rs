//! Conversion between JSON subtrees and the flat leaf rows stored in SQLite.
//!
//! Paths are stored in their display form (`/a/b`). Leaf values are compact
//! JSON. Nulls are never stored, so writing one simply removes rows.

use serde_json::{Map, Value};
use vigil_core::path::TreePath;

use crate::Result;

/// One stored row: absolute path and JSON-encoded leaf.
pub type Leaf = (String, String);

/// The `(exact, lower, upper)` bounds selecting `path` and its descendants.
pub fn subtree_bounds(path: &TreePath) -> (String, String, String) {
  let exact = path.to_string();
  (exact.clone(), format!("{exact}/"), format!("{exact}0"))
}

/// The `(lower, upper)` bounds selecting only the descendants of `path`.
/// The root's descendants are every stored path.
pub fn descendant_bounds(path: &TreePath) -> (String, String) {
  if path.is_root() {
    return ("/".to_owned(), "0".to_owned());
  }
  let (_, lower, upper) = subtree_bounds(path);
  (lower, upper)
}

/// Every ancestor of `path`, nearest first, including the root.
pub fn ancestors(path: &TreePath) -> Vec<String> {
  std::iter::successors(path.parent(), TreePath::parent)
    .map(|p| p.to_string())
    .collect()
}

/// Flatten `value` into the leaf rows it would occupy at `base`.
pub fn flatten(base: &TreePath, value: &Value) -> Result<Vec<Leaf>> {
  let mut leaves = Vec::new();
  flatten_into(base, value, &mut leaves)?;
  Ok(leaves)
}

fn flatten_into(at: &TreePath, value: &Value, out: &mut Vec<Leaf>) -> Result<()> {
  match value {
    Value::Null => {}
    Value::Object(map) => {
      for (key, child) in map {
        flatten_into(&at.child(key)?, child, out)?;
      }
    }
    leaf => out.push((at.to_string(), serde_json::to_string(leaf)?)),
  }
  Ok(())
}

/// Rebuild the subtree rooted at `base` from its rows. No rows reads as
/// `Value::Null`.
pub fn unflatten(base: &TreePath, rows: Vec<Leaf>) -> Result<Value> {
  let prefix = if base.is_root() { String::new() } else { base.to_string() };
  let mut root = Value::Null;
  for (path, json) in rows {
    let Some(rest) = path.strip_prefix(prefix.as_str()) else {
      continue;
    };
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    insert(&mut root, &segments, serde_json::from_str(&json)?);
  }
  Ok(root)
}

fn insert(node: &mut Value, segments: &[&str], leaf: Value) {
  let Some((first, rest)) = segments.split_first() else {
    *node = leaf;
    return;
  };
  if !node.is_object() {
    *node = Value::Object(Map::new());
  }
  if let Value::Object(map) = node {
    let child = map.entry((*first).to_owned()).or_insert(Value::Null);
    insert(child, rest, leaf);
  }
}

//! [`MemoryTree`] — an in-process [`DocumentTree`] with push-style delivery.
//!
//! Every operation is applied and answered from a spawned task, never inline,
//! so callers see the same asynchronous callback behaviour as with a remote
//! store. Faults can be injected per subtree: added latency, hard failures,
//! read-only subtrees, and stalls where the callback is parked until
//! [`MemoryTree::release_stalled`] is called (or forever).

use std::{
  sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use serde_json::{Map, Value};
use tokio::runtime::Handle;
use uuid::Uuid;
use vigil_core::{
  path::TreePath,
  tree::{CompletionListener, DocumentTree, Snapshot, TreeFault, ValueListener},
};

type Parked = Box<dyn FnOnce() + Send>;

#[derive(Debug, Clone, Default)]
struct Faults {
  latency: Duration,
  failing: Vec<(TreePath, String)>,
  denied:  Vec<TreePath>,
  stalled: Vec<TreePath>,
}

impl Faults {
  /// Faults apply to the subtree they were registered on and to every
  /// ancestor read that would include it.
  fn overlaps(target: &TreePath, root: &TreePath) -> bool {
    target.starts_with(root) || root.starts_with(target)
  }

  fn failure_for(&self, path: &TreePath, write: bool) -> Option<TreeFault> {
    if write && self.denied.iter().any(|root| path.starts_with(root)) {
      return Some(TreeFault::new("permission denied"));
    }
    self
      .failing
      .iter()
      .find(|(root, _)| Self::overlaps(path, root))
      .map(|(_, message)| TreeFault::new(message.clone()))
  }

  fn is_stalled(&self, path: &TreePath) -> bool {
    self.stalled.iter().any(|root| Self::overlaps(path, root))
  }
}

#[derive(Default)]
struct Inner {
  root:   Mutex<Value>,
  faults: Mutex<Faults>,
  parked: Mutex<Vec<Parked>>,
  writes: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An in-memory document tree. Cloning shares the same tree.
#[derive(Clone)]
pub struct MemoryTree {
  inner:   Arc<Inner>,
  runtime: Handle,
}

impl MemoryTree {
  /// Create an empty tree whose callbacks run on the current tokio runtime.
  ///
  /// # Panics
  ///
  /// Panics when called outside a tokio runtime.
  pub fn new() -> Self {
    Self {
      inner:   Arc::default(),
      runtime: Handle::current(),
    }
  }

  /// Create a tree pre-populated with `root`.
  pub fn with_root(root: Value) -> Self {
    let tree = Self::new();
    *lock(&tree.inner.root) = prune(root);
    tree
  }

  /// The current contents at `path`, read synchronously.
  pub fn peek(&self, path: &TreePath) -> Value {
    get_at(&lock(&self.inner.root), path.segments())
  }

  /// Number of writes that have been applied so far.
  pub fn write_count(&self) -> usize { self.inner.writes.load(Ordering::SeqCst) }

  /// Delay every callback by `latency`.
  pub fn set_latency(&self, latency: Duration) {
    lock(&self.inner.faults).latency = latency;
  }

  /// Fail every operation touching `path` with `message`.
  pub fn fail_under(&self, path: TreePath, message: impl Into<String>) {
    lock(&self.inner.faults).failing.push((path, message.into()));
  }

  /// Reject writes at or below `path`; reads still succeed.
  pub fn deny_writes_under(&self, path: TreePath) {
    lock(&self.inner.faults).denied.push(path);
  }

  /// Park every operation touching `path` instead of answering it.
  pub fn stall_under(&self, path: TreePath) {
    lock(&self.inner.faults).stalled.push(path);
  }

  pub fn clear_faults(&self) { *lock(&self.inner.faults) = Faults::default(); }

  /// Apply and answer every parked operation, in the order it arrived.
  /// Returns how many were released.
  pub fn release_stalled(&self) -> usize {
    let parked = std::mem::take(&mut *lock(&self.inner.parked));
    let count = parked.len();
    for job in parked {
      job();
    }
    count
  }

  /// Route one operation through the fault table and deliver it.
  fn schedule<F>(&self, path: &TreePath, write: bool, job: F)
  where
    F: FnOnce(Option<TreeFault>) + Send + 'static,
  {
    let faults = lock(&self.inner.faults).clone();
    let failure = faults.failure_for(path, write);
    let job: Parked = Box::new(move || job(failure));

    if faults.is_stalled(path) {
      lock(&self.inner.parked).push(job);
      return;
    }

    let latency = faults.latency;
    self.runtime.spawn(async move {
      if !latency.is_zero() {
        tokio::time::sleep(latency).await;
      }
      job();
    });
  }

  fn schedule_write<F>(
    &self,
    path: &TreePath,
    on_complete: CompletionListener,
    mutate: F,
  ) where
    F: FnOnce(&mut Value) -> Result<(), TreeFault> + Send + 'static,
  {
    let inner = Arc::clone(&self.inner);
    self.schedule(path, true, move |failure| {
      let outcome = match failure {
        Some(fault) => Err(fault),
        None => {
          let result = mutate(&mut lock(&inner.root));
          if result.is_ok() {
            inner.writes.fetch_add(1, Ordering::SeqCst);
          }
          result
        }
      };
      on_complete(outcome);
    });
  }
}

impl Default for MemoryTree {
  fn default() -> Self { Self::new() }
}

impl DocumentTree for MemoryTree {
  fn read_once(&self, path: &TreePath, listener: ValueListener) {
    let inner = Arc::clone(&self.inner);
    let target = path.clone();
    self.schedule(path, false, move |failure| {
      let outcome = match failure {
        Some(fault) => Err(fault),
        None => Ok(get_at(&lock(&inner.root), target.segments())),
      };
      listener(outcome);
    });
  }

  fn set_value(
    &self,
    path: &TreePath,
    value: Snapshot,
    on_complete: CompletionListener,
  ) {
    let target = path.clone();
    self.schedule_write(path, on_complete, move |root| {
      set_at(root, target.segments(), value);
      Ok(())
    });
  }

  fn update_children(
    &self,
    path: &TreePath,
    children: Map<String, Value>,
    on_complete: CompletionListener,
  ) {
    let target = path.clone();
    self.schedule_write(path, on_complete, move |root| {
      // Validate every key before touching anything.
      let mut writes = Vec::with_capacity(children.len());
      for (key, value) in children {
        let child = target
          .child(&key)
          .map_err(|e| TreeFault::new(e.to_string()))?;
        writes.push((child, value));
      }
      for (child, value) in writes {
        set_at(root, child.segments(), value);
      }
      Ok(())
    });
  }

  fn push_key(&self) -> String { Uuid::now_v7().simple().to_string() }
}

// ─── Value tree helpers ──────────────────────────────────────────────────────

fn get_at(root: &Value, segments: &[String]) -> Value {
  segments
    .iter()
    .try_fold(root, |node, segment| node.get(segment))
    .cloned()
    .unwrap_or(Value::Null)
}

fn set_at(root: &mut Value, segments: &[String], value: Value) {
  let value = prune(value);
  let Some((first, rest)) = segments.split_first() else {
    *root = value;
    return;
  };

  if value.is_null() {
    remove_at(root, segments);
    return;
  }

  if !root.is_object() {
    *root = Value::Object(Map::new());
  }
  if let Value::Object(map) = root {
    let child = map.entry(first.clone()).or_insert(Value::Null);
    set_at(child, rest, value);
  }
}

fn remove_at(root: &mut Value, segments: &[String]) {
  let Some((first, rest)) = segments.split_first() else {
    *root = Value::Null;
    return;
  };
  let Value::Object(map) = root else {
    return;
  };
  if let Some(child) = map.get_mut(first) {
    remove_at(child, rest);
    if child.is_null() {
      map.remove(first);
    }
  }
  if map.is_empty() {
    *root = Value::Null;
  }
}

/// Drop null members and empty objects, recursively. A tree never stores
/// either.
fn prune(value: Value) -> Value {
  match value {
    Value::Object(map) => {
      let pruned: Map<String, Value> = map
        .into_iter()
        .map(|(k, v)| (k, prune(v)))
        .filter(|(_, v)| !v.is_null())
        .collect();
      if pruned.is_empty() {
        Value::Null
      } else {
        Value::Object(pruned)
      }
    }
    other => other,
  }
}

//! SQL schema for the Vigil SQLite tree.
//!
//! The tree is stored flattened: one row per leaf, keyed by its absolute
//! path. Objects exist only implicitly, as the common prefix of their
//! leaves, so an object with no leaves cannot be stored.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS nodes (
    path        TEXT PRIMARY KEY,   -- '/tenants/acme/alerts/k1/sent'
    value_json  TEXT NOT NULL       -- JSON scalar or array, never an object
);

PRAGMA user_version = 1;
";

/// Rows at or below a path: the node itself, then everything whose path
/// starts with `path/`. `'0'` is the character after `'/'`, so the range
/// covers exactly the descendants.
pub const SELECT_SUBTREE: &str = "
SELECT path, value_json FROM nodes
 WHERE path = ?1 OR (path >= ?2 AND path < ?3)
 ORDER BY path
";

/// Distinct first path segment below a prefix. `?1`/`?2` bound the
/// descendants as in [`SELECT_SUBTREE`]; `?3` is the 1-based position just
/// past the prefix. Only the primary-key index is touched.
pub const SELECT_CHILD_KEYS: &str = "
SELECT DISTINCT
       CASE WHEN instr(substr(path, ?3), '/') = 0 THEN substr(path, ?3)
            ELSE substr(path, ?3, instr(substr(path, ?3), '/') - 1)
       END AS key
  FROM nodes
 WHERE path >= ?1 AND path < ?2
 ORDER BY key
";

pub const SELECT_ALL: &str = "SELECT path, value_json FROM nodes ORDER BY path";

pub const DELETE_SUBTREE: &str =
  "DELETE FROM nodes WHERE path = ?1 OR (path >= ?2 AND path < ?3)";

pub const DELETE_ALL: &str = "DELETE FROM nodes";

pub const DELETE_NODE: &str = "DELETE FROM nodes WHERE path = ?1";

pub const INSERT_LEAF: &str = "INSERT INTO nodes (path, value_json) VALUES (?1, ?2)";

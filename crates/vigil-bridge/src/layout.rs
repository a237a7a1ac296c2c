//! Where things live in the tree.
//!
//! ```text
//! /users/{accountId}
//! /tenants/{tenantId}/alerts/{id}
//! /tenants/{tenantId}/reminders/{id}
//! /tenants/{tenantId}/machines/{machineId}
//! /tenants/{tenantId}/verificationHistory/{id}
//! ```

use vigil_core::{Result, path::TreePath, record::RecordKind};

const USERS: &str = "users";
const TENANTS: &str = "tenants";
const MACHINES: &str = "machines";
const HISTORY: &str = "verificationHistory";

pub fn accounts() -> Result<TreePath> { TreePath::root().child(USERS) }

pub fn account(id: &str) -> Result<TreePath> { accounts()?.child(id) }

pub fn tenants() -> Result<TreePath> { TreePath::root().child(TENANTS) }

pub fn collection(tenant: &str, kind: RecordKind) -> Result<TreePath> {
  tenants()?.child(tenant)?.child(kind.collection())
}

pub fn record(tenant: &str, kind: RecordKind, id: &str) -> Result<TreePath> {
  collection(tenant, kind)?.child(id)
}

pub fn machine(tenant: &str, id: &str) -> Result<TreePath> {
  tenants()?.child(tenant)?.child(MACHINES)?.child(id)
}

pub fn history(tenant: &str) -> Result<TreePath> {
  tenants()?.child(tenant)?.child(HISTORY)
}

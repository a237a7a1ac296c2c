//! [`TreeDirectory`] — accounts and machines read straight from the tree.
//!
//! Accounts live under `/users/{id}` with `role`, `email`, `firstName` and
//! `lastName` fields; machines under `/tenants/{t}/machines/{id}` with a
//! `name` field.

use serde_json::{Map, Value};
use vigil_core::{
  Error, Result,
  directory::{Account, Directory, Machine, MachineDirectory},
  tree::DocumentTree,
};

use crate::{bridge::StoreBridge, codec::read_string, layout};

pub struct TreeDirectory<T> {
  bridge: StoreBridge<T>,
}

impl<T> Clone for TreeDirectory<T> {
  fn clone(&self) -> Self {
    Self {
      bridge: self.bridge.clone(),
    }
  }
}

impl<T: DocumentTree> TreeDirectory<T> {
  pub fn new(bridge: StoreBridge<T>) -> Self { Self { bridge } }
}

fn decode_account(id: &str, doc: &Map<String, Value>) -> Account {
  Account {
    id:         id.to_owned(),
    role:       read_string(doc, "role"),
    email:      read_string(doc, "email"),
    first_name: read_string(doc, "firstName"),
    last_name:  read_string(doc, "lastName"),
  }
}

impl<T: DocumentTree> Directory for TreeDirectory<T> {
  async fn list_accounts(&self) -> Result<Vec<Account>> {
    let snapshot = self.bridge.read_collection(&layout::accounts()?).await?;
    let Value::Object(docs) = snapshot else {
      return Ok(Vec::new());
    };
    Ok(
      docs
        .iter()
        .filter_map(|(id, doc)| doc.as_object().map(|doc| decode_account(id, doc)))
        .collect(),
    )
  }

  async fn get_account(&self, id: &str) -> Result<Option<Account>> {
    let path = match layout::account(id) {
      Ok(path) => path,
      // An id that cannot be a key cannot name an account.
      Err(Error::InvalidPath(_)) => return Ok(None),
      Err(e) => return Err(e),
    };
    let doc = self.bridge.read_subtree(&path).await?;
    Ok(doc.as_object().map(|doc| decode_account(id, doc)))
  }
}

impl<T: DocumentTree> MachineDirectory for TreeDirectory<T> {
  async fn get_machine(&self, tenant_id: &str, machine_id: &str) -> Result<Option<Machine>> {
    let path = layout::machine(tenant_id, machine_id)?;
    let doc = self.bridge.read_subtree(&path).await?;
    Ok(doc.as_object().map(|doc| Machine {
      id:    machine_id.to_owned(),
      label: read_string(doc, "name"),
    }))
  }
}

/* src/server/core/rust/src/context.rs */

use std::sync::Arc;

use crate::store::Store;

/// Values provided by enclosing components to the subtree below them.
#[derive(Clone, Default)]
pub struct Context {
  store: Option<Arc<Store>>,
}

impl Context {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_store(store: Arc<Store>) -> Self {
    Self { store: Some(store) }
  }

  pub fn store(&self) -> Option<&Arc<Store>> {
    self.store.as_ref()
  }
}

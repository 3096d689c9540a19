/* src/server/core/rust/src/store.rs */

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::errors::RefetchError;
use crate::registry::{REFETCH_STATE_FIELD, RefetchState};

/// Application state: the refetch slice plus free-form slices written by loaders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalState {
  #[serde(default)]
  pub refetch: RefetchState,
  #[serde(flatten)]
  pub slices: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone)]
pub enum Action {
  /// Completion of every loader for a navigation key.
  DataLoaded { key: String },
  /// Replace one application slice.
  SetSlice { name: String, value: serde_json::Value },
}

impl GlobalState {
  fn reduce(&mut self, action: Action) {
    match action {
      Action::DataLoaded { key } => self.refetch.loaded_locations.mark_loaded(&key),
      Action::SetSlice { name, value } => {
        if name == REFETCH_STATE_FIELD {
          tracing::warn!(slice = %name, "ignoring write to reserved state slice");
          return;
        }
        self.slices.insert(name, value);
      }
    }
  }
}

/// Shared state container. Loaders write through [`Store::dispatch`];
/// coordinators only read.
#[derive(Debug, Default)]
pub struct Store {
  state: RwLock<GlobalState>,
}

impl Store {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_state(state: GlobalState) -> Self {
    Self { state: RwLock::new(state) }
  }

  /// Seed a store from initial slices, e.g. reducers contributed by code bundles.
  pub fn with_slices(slices: serde_json::Map<String, serde_json::Value>) -> Self {
    let mut state = GlobalState::default();
    for (name, value) in slices {
      state.reduce(Action::SetSlice { name, value });
    }
    Self::with_state(state)
  }

  /// Rebuild a store from state serialized by the server render.
  pub fn hydrate(initial_state: serde_json::Value) -> Result<Self, RefetchError> {
    let state = match initial_state {
      serde_json::Value::Null => GlobalState::default(),
      value => serde_json::from_value(value)?,
    };
    Ok(Self::with_state(state))
  }

  pub fn read<R>(&self, f: impl FnOnce(&GlobalState) -> R) -> R {
    f(&self.state.read())
  }

  pub fn get_state(&self) -> GlobalState {
    self.state.read().clone()
  }

  pub fn slice(&self, name: &str) -> Option<serde_json::Value> {
    self.state.read().slices.get(name).cloned()
  }

  pub fn dispatch(&self, action: Action) {
    tracing::trace!(?action, "dispatch");
    self.state.write().reduce(action);
  }

  pub fn to_json(&self) -> Result<serde_json::Value, RefetchError> {
    Ok(serde_json::to_value(&*self.state.read())?)
  }
}

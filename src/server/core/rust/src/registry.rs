/* src/server/core/rust/src/registry.rs */

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Well-known state field holding [`RefetchState`].
pub const REFETCH_STATE_FIELD: &str = "refetch";

/// Navigation keys whose data finished loading.
///
/// Append-only for the lifetime of the store: a server store lives for one
/// request, a client store for one page session, so entries are never evicted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoadedLocations(BTreeMap<String, bool>);

impl LoadedLocations {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_loaded(&self, key: &str) -> bool {
    self.0.get(key).copied().unwrap_or(false)
  }

  pub(crate) fn mark_loaded(&mut self, key: &str) {
    self.0.insert(key.to_string(), true);
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.0.iter().filter(|(_, loaded)| **loaded).map(|(k, _)| k.as_str())
  }
}

impl<K: Into<String>> FromIterator<K> for LoadedLocations {
  fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
    Self(iter.into_iter().map(|k| (k.into(), true)).collect())
  }
}

/// Slice of global state owned by the refetch reducer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefetchState {
  #[serde(default)]
  pub loaded_locations: LoadedLocations,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn absent_and_false_entries_are_not_loaded() {
    let mut loaded: LoadedLocations =
      serde_json::from_value(serde_json::json!({ "k1": true, "k2": false })).expect("parse");
    assert!(loaded.is_loaded("k1"));
    assert!(!loaded.is_loaded("k2"));
    assert!(!loaded.is_loaded("k3"));

    loaded.mark_loaded("k2");
    assert!(loaded.is_loaded("k2"));
    assert_eq!(loaded.keys().collect::<Vec<_>>(), vec!["k1", "k2"]);
  }

  #[test]
  fn state_uses_camel_case_field() {
    let state = RefetchState { loaded_locations: ["@@serverRender"].into_iter().collect() };
    assert_eq!(
      serde_json::to_value(&state).expect("serialize"),
      serde_json::json!({ "loadedLocations": { "@@serverRender": true } })
    );
  }
}

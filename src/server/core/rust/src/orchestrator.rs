/* src/server/core/rust/src/orchestrator.rs */

use std::sync::Arc;

use futures_util::future::try_join_all;

use crate::errors::RefetchError;
use crate::location::Location;
use crate::routes::FetcherRoutes;
use crate::store::{Action, Store};

/// Run every loader whose route matches `location.pathname` and wait for all
/// of them. On full success the location key is recorded in the registry
/// before this resolves; if any loader fails, nothing is recorded.
///
/// Safe to call again for a key that is already loaded: loaders rerun and the
/// registry entry is rewritten.
pub async fn load_data_for_location(
  store: &Arc<Store>,
  routes: &FetcherRoutes,
  location: &Location,
) -> Result<(), RefetchError> {
  let matched = routes.matching(&location.pathname);
  tracing::debug!(
    pathname = %location.pathname,
    key = %location.key,
    routes = matched.len(),
    "loading route data"
  );

  let loads = matched.into_iter().map(|(route, params)| {
    let path = route.path.clone();
    let pending = route.load(Arc::clone(store), params);
    async move {
      pending.await.inspect_err(|e| tracing::warn!(route = %path, error = %e, "loader failed"))
    }
  });
  try_join_all(loads).await?;

  store.dispatch(Action::DataLoaded { key: location.key.clone() });
  tracing::debug!(key = %location.key, "route data loaded");
  Ok(())
}

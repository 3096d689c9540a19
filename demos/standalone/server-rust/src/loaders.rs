/* demos/standalone/server-rust/src/loaders.rs */

use std::sync::{Arc, OnceLock};

use refetch::{Action, FetcherRoute, FetcherRoutes, MatchParams, RefetchError, Store, loader};
use serde_json::json;

const USERS: &[(&str, &str)] = &[("1", "Ada"), ("2", "Grace"), ("3", "Linus")];

/// Route table shared by every request; built once so client-side
/// coordinators see a stable configuration.
pub fn routes() -> FetcherRoutes {
  static ROUTES: OnceLock<FetcherRoutes> = OnceLock::new();
  ROUTES.get_or_init(build_routes).clone()
}

fn build_routes() -> FetcherRoutes {
  let table = [
    FetcherRoute::exact("/", loader(load_users)),
    FetcherRoute::exact("/user/:id", loader(load_user)),
  ];
  // Patterns above are static; a bad one is dropped with an error log.
  let routes = table
    .into_iter()
    .filter_map(|route| route.inspect_err(|e| tracing::error!(error = %e, "bad route")).ok())
    .collect();
  FetcherRoutes::new(routes)
}

async fn load_users(store: Arc<Store>, _: MatchParams) -> Result<(), RefetchError> {
  let users: Vec<_> = USERS.iter().map(|(id, name)| json!({ "id": id, "name": name })).collect();
  store.dispatch(Action::SetSlice { name: "users".into(), value: json!(users) });
  Ok(())
}

async fn load_user(store: Arc<Store>, params: MatchParams) -> Result<(), RefetchError> {
  let id = params.get("id").map(String::as_str).unwrap_or_default();
  let user = USERS
    .iter()
    .find(|(uid, _)| *uid == id)
    .map(|(uid, name)| json!({ "id": uid, "name": name }))
    .unwrap_or(serde_json::Value::Null);
  tracing::debug!(id, found = !user.is_null(), "user loaded");
  store.dispatch(Action::SetSlice { name: "user".into(), value: user });
  Ok(())
}

/* src/server/adapter/axum/src/render/tests.rs */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use refetch::{
  Action, Context, CoordinatorConfig, CoordinatorProps, Evaluation, FetchCoordinator,
  FetcherRoute, FetcherRoutes, Location, MatchParams, RefetchError, Store, Template,
  extract_initial_state, loader,
};
use serde_json::json;

use super::*;
use crate::bundle::{BundleModule, RouteBundles};

fn user_routes(calls: Arc<AtomicUsize>) -> FetcherRoutes {
  FetcherRoutes::new(vec![
    FetcherRoute::exact(
      "/user/:id",
      loader(move |store: Arc<Store>, params: MatchParams| {
        let calls = calls.clone();
        async move {
          calls.fetch_add(1, Ordering::SeqCst);
          let id = params.get("id").cloned().unwrap_or_default();
          store.dispatch(Action::SetSlice { name: "user".into(), value: json!({ "id": id }) });
          Ok(())
        }
      }),
    )
    .expect("valid"),
    FetcherRoute::exact(
      "/broken",
      loader(|_, _| async { Err(RefetchError::loader("/broken", "db down")) }),
    )
    .expect("valid"),
  ])
}

fn user_page(
  store: &Store,
  location: &Location,
  ctx: &mut RenderContext,
) -> Result<String, RefetchError> {
  match location.pathname.as_str() {
    "/moved" => {
      ctx.redirect("/user/1");
      Ok(String::new())
    }
    "/gone" => {
      ctx.status = Some(404);
      Ok("<p>not found</p>".into())
    }
    _ => {
      let id = store.slice("user").and_then(|u| u["id"].as_str().map(String::from));
      Ok(format!("<p>user {}</p>", id.unwrap_or_default()))
    }
  }
}

fn renderer(calls: Arc<AtomicUsize>) -> ServerRenderer {
  ServerRenderer::new(Template::default(), user_page).routes(move || user_routes(calls.clone()))
}

#[tokio::test]
async fn embeds_loaded_state() {
  let result = renderer(Arc::default()).render("/user/7?tab=repos").await;
  assert_eq!(result.status, 200);
  assert!(result.url.is_none());
  assert!(result.body.contains("<p>user 7</p>"));

  let state =
    extract_initial_state(&result.body, "__INITIAL_STATE__").expect("json").expect("script");
  assert_eq!(state["user"], json!({ "id": "7" }));
  assert_eq!(state["refetch"]["loadedLocations"], json!({ "@@serverRender": true }));
}

#[tokio::test]
async fn redirect_defaults_to_301() {
  let result = renderer(Arc::default()).render("/moved").await;
  assert_eq!(result.status, 301);
  assert_eq!(result.url.as_deref(), Some("/user/1"));
}

#[tokio::test]
async fn context_status_wins() {
  let result = renderer(Arc::default()).render("/gone").await;
  assert_eq!(result.status, 404);
  assert!(result.body.contains("<p>not found</p>"));
}

#[tokio::test]
async fn loader_failure_renders_empty_500() {
  let result = renderer(Arc::default()).render("/broken").await;
  assert_eq!(result.status, 500);
  assert!(result.url.is_none());
  assert_eq!(result.body, Template::default().render_template("", &json!({})));
}

#[tokio::test]
async fn failed_bundle_skips_loaders() {
  let calls = Arc::new(AtomicUsize::new(0));
  let bundles = RouteBundles::new()
    .bundle("user", "/user", || async { Err("chunk missing".to_string()) })
    .expect("valid");
  let result = renderer(calls.clone()).bundles(bundles).render("/user/1").await;

  assert_eq!(result.status, 500);
  assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn bundles_contribute_slices_and_routes() {
  let bundles = RouteBundles::new()
    .bundle("settings", "/settings", || async {
      let mut initial_state = serde_json::Map::new();
      initial_state.insert("theme".into(), json!("dark"));
      let route = FetcherRoute::exact(
        "/settings",
        loader(|store, _| async move {
          store.dispatch(Action::SetSlice { name: "prefs".into(), value: json!({ "lang": "en" }) });
          Ok(())
        }),
      )
      .map_err(|e| e.to_string())?;
      Ok::<_, String>(BundleModule { initial_state, routes: vec![route] })
    })
    .expect("valid");
  let result = renderer(Arc::default()).bundles(bundles).render("/settings").await;

  let state =
    extract_initial_state(&result.body, "__INITIAL_STATE__").expect("json").expect("script");
  assert_eq!(state["theme"], json!("dark"));
  assert_eq!(state["prefs"], json!({ "lang": "en" }));
}

#[tokio::test]
async fn client_resumes_from_server_state() {
  let calls = Arc::new(AtomicUsize::new(0));
  let page = renderer(calls.clone()).render("/user/1").await;
  assert_eq!(calls.load(Ordering::SeqCst), 1);

  let state =
    extract_initial_state(&page.body, "__INITIAL_STATE__").expect("json").expect("script");
  let store = Arc::new(Store::hydrate(state).expect("hydrate"));
  let config = CoordinatorConfig::new(user_routes(calls.clone()));
  let mut coordinator = FetchCoordinator::new(
    &Context::with_store(store.clone()),
    CoordinatorProps::new(config, Location::with_key("/user/1", "k0")),
  )
  .expect("store provided");

  // First client evaluation reuses the server's data.
  assert!(matches!(coordinator.on_mount(), Evaluation::Ready));
  assert_eq!(calls.load(Ordering::SeqCst), 1);

  let next = coordinator.props().navigate(Location::with_key("/user/2", "k1"));
  coordinator.on_navigate(next).settle().await.expect("load");
  assert_eq!(calls.load(Ordering::SeqCst), 2);
  assert_eq!(coordinator.last_loaded_key(), "k1");
  assert_eq!(store.slice("user"), Some(json!({ "id": "2" })));
}

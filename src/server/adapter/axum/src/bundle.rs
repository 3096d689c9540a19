/* src/server/adapter/axum/src/bundle.rs */

use std::future::Future;
use std::sync::Arc;

use futures_util::future::join_all;
use refetch::{
  BoxFuture, FetcherRoute, PathMatcher, PatternMatcher, RefetchError, create_location_from_url,
};

/// What a code bundle contributes to a request: initial state slices and
/// extra fetcher routes for the pages it contains.
#[derive(Default)]
pub struct BundleModule {
  pub initial_state: serde_json::Map<String, serde_json::Value>,
  pub routes: Vec<FetcherRoute>,
}

/// Outcome of preloading one bundle.
pub struct BundleMeta {
  pub name: String,
  pub module: Result<BundleModule, String>,
}

/// Preloads the bundles a request URL needs. Every attempted bundle is
/// reported, failed ones included.
pub trait BundleLoader: Send + Sync {
  fn load_bundles(&self, url: &str) -> BoxFuture<Vec<BundleMeta>>;
}

/// Loader for apps without code splitting.
pub struct NoBundles;

impl BundleLoader for NoBundles {
  fn load_bundles(&self, _url: &str) -> BoxFuture<Vec<BundleMeta>> {
    Box::pin(async { Vec::new() })
  }
}

pub type BundleFactory = Arc<dyn Fn() -> BoxFuture<Result<BundleModule, String>> + Send + Sync>;

struct BundleEntry {
  name: String,
  matcher: PatternMatcher,
  factory: BundleFactory,
}

/// Bundles keyed by route pattern; a request loads every bundle whose
/// pattern prefix-matches its pathname.
#[derive(Clone, Default)]
pub struct RouteBundles {
  entries: Vec<Arc<BundleEntry>>,
}

impl RouteBundles {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn bundle<F, Fut>(
    mut self,
    name: impl Into<String>,
    pattern: &str,
    factory: F,
  ) -> Result<Self, RefetchError>
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<BundleModule, String>> + Send + 'static,
  {
    let factory: BundleFactory = Arc::new(move || Box::pin(factory()));
    self.entries.push(Arc::new(BundleEntry {
      name: name.into(),
      matcher: PatternMatcher::new(pattern, false)?,
      factory,
    }));
    Ok(self)
  }
}

impl BundleLoader for RouteBundles {
  fn load_bundles(&self, url: &str) -> BoxFuture<Vec<BundleMeta>> {
    let pathname = create_location_from_url(url).pathname;
    let matched: Vec<Arc<BundleEntry>> =
      self.entries.iter().filter(|e| e.matcher.match_path(&pathname).is_some()).cloned().collect();

    Box::pin(async move {
      let loads = matched.into_iter().map(|entry| async move {
        let module = (entry.factory)().await;
        BundleMeta { name: entry.name.clone(), module }
      });
      join_all(loads).await
    })
  }
}

/// All bundles or an error naming every one that failed to load.
pub fn reject_failed_bundles(
  bundles: Vec<BundleMeta>,
) -> Result<Vec<(String, BundleModule)>, RefetchError> {
  let mut loaded = Vec::with_capacity(bundles.len());
  let mut failed = Vec::new();
  for meta in bundles {
    match meta.module {
      Ok(module) => loaded.push((meta.name, module)),
      Err(reason) => {
        tracing::warn!(bundle = %meta.name, %reason, "bundle failed to load");
        failed.push(meta.name);
      }
    }
  }
  if failed.is_empty() { Ok(loaded) } else { Err(RefetchError::BundleFailed { names: failed }) }
}

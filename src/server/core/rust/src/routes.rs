/* src/server/core/rust/src/routes.rs */

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::errors::RefetchError;
use crate::store::Store;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Route parameters extracted by a matcher, keyed by parameter name.
pub type MatchParams = HashMap<String, String>;

pub type LoaderFn =
  Arc<dyn Fn(Arc<Store>, MatchParams) -> BoxFuture<Result<(), RefetchError>> + Send + Sync>;

/// Box an async function into a [`LoaderFn`].
pub fn loader<F, Fut>(f: F) -> LoaderFn
where
  F: Fn(Arc<Store>, MatchParams) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<(), RefetchError>> + Send + 'static,
{
  Arc::new(move |store, params| Box::pin(f(store, params)))
}

/// Maps a pathname to route parameters, or `None` when the route does not apply.
pub trait PathMatcher: Send + Sync {
  fn match_path(&self, pathname: &str) -> Option<MatchParams>;
}

// Catch-all used to emulate prefix matching; stripped from the reported params.
const TAIL_PARAM: &str = "__refetch_tail";

/// Default matcher backed by `matchit`. Accepts `:param` and `{param}` segments.
/// Non-exact patterns also match any deeper path (`/users` matches `/users/42`).
pub struct PatternMatcher {
  router: matchit::Router<()>,
}

impl PatternMatcher {
  pub fn new(pattern: &str, exact: bool) -> Result<Self, RefetchError> {
    let converted = convert_route_path(pattern);
    let invalid = |e: matchit::InsertError| RefetchError::InvalidRoute {
      pattern: pattern.to_string(),
      message: e.to_string(),
    };

    let mut router = matchit::Router::new();
    router.insert(converted.clone(), ()).map_err(invalid)?;
    let ends_in_catch_all = converted.rsplit('/').next().is_some_and(|seg| seg.starts_with("{*"));
    if !exact && !ends_in_catch_all {
      let prefix = converted.trim_end_matches('/');
      router.insert(format!("{prefix}/{{*{TAIL_PARAM}}}"), ()).map_err(invalid)?;
    }
    Ok(Self { router })
  }
}

impl PathMatcher for PatternMatcher {
  fn match_path(&self, pathname: &str) -> Option<MatchParams> {
    let matched = self.router.at(normalize_pathname(pathname)).ok()?;
    Some(
      matched
        .params
        .iter()
        .filter(|(name, _)| *name != TAIL_PARAM)
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect(),
    )
  }
}

/// Convert `:param` route syntax to matchit's `{param}`; ensure a leading slash.
pub(crate) fn convert_route_path(path: &str) -> String {
  let segments: Vec<String> = path
    .split('/')
    .filter(|s| !s.is_empty())
    .map(|seg| match seg.strip_prefix(':') {
      Some(name) => format!("{{{name}}}"),
      None => seg.to_string(),
    })
    .collect();
  format!("/{}", segments.join("/"))
}

/// Trailing slashes are not significant; an empty pathname is the root.
fn normalize_pathname(pathname: &str) -> &str {
  let trimmed = pathname.trim_end_matches('/');
  if trimmed.is_empty() { "/" } else { trimmed }
}

/// One route-to-data mapping entry.
pub struct FetcherRoute {
  pub path: String,
  matcher: Arc<dyn PathMatcher>,
  loader: LoaderFn,
}

impl FetcherRoute {
  /// Prefix-matching route, like an un-`exact` router entry.
  pub fn new(path: impl Into<String>, loader: LoaderFn) -> Result<Self, RefetchError> {
    let path = path.into();
    let matcher = PatternMatcher::new(&path, false)?;
    Ok(Self::with_matcher(path, Arc::new(matcher), loader))
  }

  pub fn exact(path: impl Into<String>, loader: LoaderFn) -> Result<Self, RefetchError> {
    let path = path.into();
    let matcher = PatternMatcher::new(&path, true)?;
    Ok(Self::with_matcher(path, Arc::new(matcher), loader))
  }

  pub fn with_matcher(
    path: impl Into<String>,
    matcher: Arc<dyn PathMatcher>,
    loader: LoaderFn,
  ) -> Self {
    Self { path: path.into(), matcher, loader }
  }

  pub fn match_path(&self, pathname: &str) -> Option<MatchParams> {
    self.matcher.match_path(pathname)
  }

  pub(crate) fn load(
    &self,
    store: Arc<Store>,
    params: MatchParams,
  ) -> BoxFuture<Result<(), RefetchError>> {
    (self.loader)(store, params)
  }
}

/// Which matching routes get their loaders invoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
  /// Every matching route, in declaration order (layouts and pages together).
  #[default]
  All,
  /// Only the first matching route.
  First,
}

/// Ordered, immutable route configuration. Clones share the same
/// configuration; [`FetcherRoutes::same_config`] compares by identity.
#[derive(Clone)]
pub struct FetcherRoutes {
  routes: Arc<[Arc<FetcherRoute>]>,
  mode: MatchMode,
}

impl FetcherRoutes {
  pub fn new(routes: Vec<FetcherRoute>) -> Self {
    Self { routes: routes.into_iter().map(Arc::new).collect(), mode: MatchMode::All }
  }

  pub fn empty() -> Self {
    Self::new(Vec::new())
  }

  pub fn match_mode(mut self, mode: MatchMode) -> Self {
    self.mode = mode;
    self
  }

  pub fn same_config(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.routes, &other.routes) && self.mode == other.mode
  }

  /// New configuration with `extra` appended after the existing routes.
  pub fn extended(&self, extra: Vec<FetcherRoute>) -> Self {
    let routes = self.routes.iter().cloned().chain(extra.into_iter().map(Arc::new)).collect();
    Self { routes, mode: self.mode }
  }

  pub fn len(&self) -> usize {
    self.routes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.routes.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &FetcherRoute> {
    self.routes.iter().map(|route| &**route)
  }

  /// Routes whose pattern matches `pathname`, with their params.
  pub fn matching(&self, pathname: &str) -> Vec<(&FetcherRoute, MatchParams)> {
    let matches = self.iter().filter_map(|route| route.match_path(pathname).map(|p| (route, p)));
    match self.mode {
      MatchMode::All => matches.collect(),
      MatchMode::First => matches.take(1).collect(),
    }
  }
}

impl std::fmt::Debug for FetcherRoutes {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FetcherRoutes")
      .field("paths", &self.iter().map(|r| r.path.as_str()).collect::<Vec<_>>())
      .field("mode", &self.mode)
      .finish()
  }
}

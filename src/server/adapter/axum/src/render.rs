/* src/server/adapter/axum/src/render.rs */

use std::path::PathBuf;
use std::sync::Arc;

use refetch::{
  FetcherRoutes, Location, RefetchError, Store, Template, create_location_from_url,
  load_data_for_location,
};

use crate::bundle::{BundleLoader, NoBundles, reject_failed_bundles};

/// Render-time side channel filled in by the view tree, e.g. a redirect
/// issued while rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderContext {
  pub url: Option<String>,
  pub status: Option<u16>,
}

impl RenderContext {
  pub fn redirect(&mut self, url: impl Into<String>) {
    self.url = Some(url.into());
  }

  pub fn is_redirected(&self) -> bool {
    self.url.is_some()
  }
}

/// Renders the application view tree to markup from the loaded store.
pub trait PageRenderer: Send + Sync {
  fn render(
    &self,
    store: &Store,
    location: &Location,
    ctx: &mut RenderContext,
  ) -> Result<String, RefetchError>;
}

impl<F> PageRenderer for F
where
  F: Fn(&Store, &Location, &mut RenderContext) -> Result<String, RefetchError> + Send + Sync,
{
  fn render(
    &self,
    store: &Store,
    location: &Location,
    ctx: &mut RenderContext,
  ) -> Result<String, RefetchError> {
    self(store, location, ctx)
  }
}

/// Final page for one request: a redirect when `url` is set, otherwise an HTML body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderResult {
  pub status: u16,
  pub body: String,
  pub url: Option<String>,
}

pub type RouteSource = Arc<dyn Fn() -> FetcherRoutes + Send + Sync>;

/// Per-request server render: bundles, fresh store, data, markup, template.
pub struct ServerRenderer {
  template: Template,
  routes: RouteSource,
  bundles: Arc<dyn BundleLoader>,
  page: Arc<dyn PageRenderer>,
  pub(crate) static_files: Option<(String, PathBuf)>,
}

impl ServerRenderer {
  pub fn new(template: Template, page: impl PageRenderer + 'static) -> Self {
    Self {
      template,
      routes: Arc::new(FetcherRoutes::empty),
      bundles: Arc::new(NoBundles),
      page: Arc::new(page),
      static_files: None,
    }
  }

  /// Route table resolved at the start of every request.
  pub fn routes(mut self, source: impl Fn() -> FetcherRoutes + Send + Sync + 'static) -> Self {
    self.routes = Arc::new(source);
    self
  }

  pub fn bundles(mut self, loader: impl BundleLoader + 'static) -> Self {
    self.bundles = Arc::new(loader);
    self
  }

  /// Serve files from `dir` under `prefix` next to the rendered pages.
  pub fn static_files(mut self, prefix: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
    self.static_files = Some((prefix.into(), dir.into()));
    self
  }

  pub fn template(&self) -> &Template {
    &self.template
  }

  /// Render `url`. Never fails: any error becomes a logged 500 page with
  /// empty markup and empty state.
  pub async fn render(&self, url: &str) -> RenderResult {
    match self.try_render(url).await {
      Ok(result) => result,
      Err(e) => {
        tracing::error!(url, code = e.code(), error = %e, "server render failed");
        let ctx = RenderContext { url: None, status: Some(500) };
        self.create_render_result(&ctx, "", &serde_json::json!({}))
      }
    }
  }

  async fn try_render(&self, url: &str) -> Result<RenderResult, RefetchError> {
    let routes = (self.routes)();

    // Every bundle must load before anything renders.
    let bundles = reject_failed_bundles(self.bundles.load_bundles(url).await)?;
    let mut initial_slices = serde_json::Map::new();
    let mut bundle_routes = Vec::new();
    for (name, module) in bundles {
      tracing::debug!(bundle = %name, routes = module.routes.len(), "bundle loaded");
      initial_slices.extend(module.initial_state);
      bundle_routes.extend(module.routes);
    }
    let routes = if bundle_routes.is_empty() { routes } else { routes.extended(bundle_routes) };

    let store = Arc::new(Store::with_slices(initial_slices));
    let location = create_location_from_url(url);
    load_data_for_location(&store, &routes, &location).await?;

    let mut ctx = RenderContext::default();
    let html = self.page.render(&store, &location, &mut ctx)?;
    let state = store.to_json()?;
    Ok(self.create_render_result(&ctx, &html, &state))
  }

  fn create_render_result(
    &self,
    ctx: &RenderContext,
    html: &str,
    initial_state: &serde_json::Value,
  ) -> RenderResult {
    let status = ctx.status.unwrap_or(if ctx.is_redirected() { 301 } else { 200 });
    RenderResult {
      status,
      body: self.template.render_template(html, initial_state),
      url: ctx.url.clone(),
    }
  }
}

#[cfg(test)]
mod tests;

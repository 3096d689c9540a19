/* src/server/adapter/axum/src/lib.rs */

//! Axum integration for `refetch`: per-request server rendering with the
//! loaded store embedded in the page, plus static file serving.

pub mod bundle;
pub mod config;
mod handler;
pub mod render;

/// Re-export refetch core for convenience
pub use refetch;

pub use bundle::{BundleLoader, BundleMeta, BundleModule, NoBundles, RouteBundles};
pub use config::RendererConfig;
pub use render::{PageRenderer, RenderContext, RenderResult, ServerRenderer};

/// Extension trait that converts a `ServerRenderer` into an Axum router.
pub trait IntoAxumRouter {
  fn into_axum_router(self) -> axum::Router;
  fn serve(
    self,
    addr: &str,
  ) -> impl std::future::Future<Output = Result<(), Box<dyn std::error::Error>>> + Send;
}

impl IntoAxumRouter for ServerRenderer {
  fn into_axum_router(self) -> axum::Router {
    handler::build_router(self)
  }

  async fn serve(self, addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let router = self.into_axum_router();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!("refetch server running on http://localhost:{}", local_addr.port());
    axum::serve(listener, router).await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use refetch::{RefetchError, Store, Template};

  use super::*;

  #[test]
  fn into_axum_router_builds_without_panic() {
    let page = |_: &Store, _: &refetch::Location, _: &mut RenderContext| {
      Ok::<_, RefetchError>(String::new())
    };
    let _router = ServerRenderer::new(Template::default(), page).into_axum_router();
  }
}

/* demos/standalone/server-rust/src/main.rs */

mod loaders;
mod pages;

use std::path::PathBuf;

use clap::Parser;
use refetch_axum::{IntoAxumRouter, RendererConfig, ServerRenderer};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "demo-server-rust", about = "Server-rendered user directory")]
struct Cli {
  /// Renderer config file
  #[arg(long, default_value = "refetch.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let cli = Cli::parse();
  let config = if cli.config.exists() {
    RendererConfig::load(&cli.config)?
  } else {
    tracing::warn!(path = %cli.config.display(), "config file not found, using defaults");
    RendererConfig::default()
  };
  let config = config.with_env_overrides()?;

  let renderer = ServerRenderer::from_config(&config, pages::render_page)?.routes(loaders::routes);
  renderer.serve(&config.addr()).await.map_err(|e| anyhow::anyhow!("serve: {e}"))
}

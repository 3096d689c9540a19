/* src/server/core/rust/src/errors.rs */

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefetchError {
  /// A coordinator was constructed without a store in its composition context.
  #[error("fetch coordinator cannot find a store in its context; provide one with Context::with_store")]
  MissingStore,

  #[error("invalid route pattern '{pattern}': {message}")]
  InvalidRoute { pattern: String, message: String },

  #[error("loader for route '{route}' failed: {message}")]
  Loader { route: String, message: String },

  #[error("failed to load bundles: {}", names.join(", "))]
  BundleFailed { names: Vec<String> },

  #[error("render failed: {0}")]
  Render(String),

  #[error("invalid configuration: {0}")]
  Config(String),

  #[error("state serialization failed: {0}")]
  State(#[from] serde_json::Error),
}

impl RefetchError {
  pub fn loader(route: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Loader { route: route.into(), message: message.into() }
  }

  pub fn render(msg: impl Into<String>) -> Self {
    Self::Render(msg.into())
  }

  pub fn config(msg: impl Into<String>) -> Self {
    Self::Config(msg.into())
  }

  pub fn code(&self) -> &'static str {
    match self {
      Self::MissingStore => "MISSING_STORE",
      Self::InvalidRoute { .. } => "INVALID_ROUTE",
      Self::Loader { .. } => "LOADER_FAILED",
      Self::BundleFailed { .. } => "BUNDLE_FAILED",
      Self::Render(_) => "RENDER_FAILED",
      Self::Config(_) => "CONFIG_ERROR",
      Self::State(_) => "STATE_ERROR",
    }
  }
}

/* src/server/adapter/axum/src/config.rs */

use std::path::{Path, PathBuf};

use refetch::{DEFAULT_HTML_MARKER, DEFAULT_STATE_ID, RefetchError, Template};
use serde::Deserialize;

use crate::render::{PageRenderer, ServerRenderer};

/// Renderer settings, read from a TOML file such as:
///
/// ```toml
/// [server]
/// port = 3000
/// static_dir = "dist/public"
///
/// [template]
/// path = "dist/index.html"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RendererConfig {
  #[serde(default)]
  pub server: ServerSection,
  #[serde(default)]
  pub template: TemplateSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
  #[serde(default = "default_host")]
  pub host: String,
  #[serde(default = "default_port")]
  pub port: u16,
  #[serde(default)]
  pub static_dir: Option<PathBuf>,
  #[serde(default = "default_static_prefix")]
  pub static_prefix: String,
}

impl Default for ServerSection {
  fn default() -> Self {
    Self {
      host: default_host(),
      port: default_port(),
      static_dir: None,
      static_prefix: default_static_prefix(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateSection {
  /// HTML shell; the built-in shell is used when unset.
  #[serde(default)]
  pub path: Option<PathBuf>,
  #[serde(default = "default_state_id")]
  pub state_id: String,
  #[serde(default = "default_html_marker")]
  pub html_marker: String,
}

impl Default for TemplateSection {
  fn default() -> Self {
    Self { path: None, state_id: default_state_id(), html_marker: default_html_marker() }
  }
}

fn default_host() -> String {
  "0.0.0.0".to_string()
}

fn default_port() -> u16 {
  3000
}

fn default_static_prefix() -> String {
  "/static".to_string()
}

fn default_state_id() -> String {
  DEFAULT_STATE_ID.to_string()
}

fn default_html_marker() -> String {
  DEFAULT_HTML_MARKER.to_string()
}

impl RendererConfig {
  pub fn from_toml_str(content: &str) -> Result<Self, RefetchError> {
    let config: Self = toml::from_str(content)
      .map_err(|e| RefetchError::config(format!("parse renderer config: {e}")))?;
    config.validate()?;
    Ok(config)
  }

  pub fn load(path: &Path) -> Result<Self, RefetchError> {
    let content = std::fs::read_to_string(path)
      .map_err(|e| RefetchError::config(format!("read {}: {e}", path.display())))?;
    Self::from_toml_str(&content)
  }

  /// Apply `PORT` and `REFETCH_TEMPLATE` from the process environment.
  pub fn with_env_overrides(self) -> Result<Self, RefetchError> {
    self.with_overrides(|name| std::env::var(name).ok())
  }

  pub fn with_overrides(
    mut self,
    lookup: impl Fn(&str) -> Option<String>,
  ) -> Result<Self, RefetchError> {
    if let Some(port) = lookup("PORT") {
      self.server.port =
        port.parse().map_err(|_| RefetchError::config(format!("PORT is not a port: {port}")))?;
    }
    if let Some(path) = lookup("REFETCH_TEMPLATE") {
      self.template.path = Some(PathBuf::from(path));
    }
    Ok(self)
  }

  pub fn validate(&self) -> Result<(), RefetchError> {
    let state_id = &self.template.state_id;
    if state_id.is_empty() || state_id.contains(['"', '<', '>', ' ']) {
      return Err(RefetchError::config(format!(
        "template.state_id \"{state_id}\" is not a usable element id"
      )));
    }
    if self.template.html_marker.is_empty() {
      return Err(RefetchError::config("template.html_marker must not be empty"));
    }
    let prefix = &self.server.static_prefix;
    if !prefix.starts_with('/') || prefix == "/" {
      return Err(RefetchError::config(format!(
        "server.static_prefix \"{prefix}\" must start with '/' and not be the root"
      )));
    }
    Ok(())
  }

  pub fn addr(&self) -> String {
    format!("{}:{}", self.server.host, self.server.port)
  }

  pub fn build_template(&self) -> Result<Template, RefetchError> {
    let template = match self.template.path {
      Some(ref path) => {
        let shell = std::fs::read_to_string(path)
          .map_err(|e| RefetchError::config(format!("read template {}: {e}", path.display())))?;
        Template::new(shell)
      }
      None => Template::default(),
    };
    Ok(template.html_marker(&self.template.html_marker).state_id(&self.template.state_id))
  }
}

impl ServerRenderer {
  /// Renderer with the configured template and static directory.
  pub fn from_config(
    config: &RendererConfig,
    page: impl PageRenderer + 'static,
  ) -> Result<Self, RefetchError> {
    config.validate()?;
    let mut renderer = Self::new(config.build_template()?, page);
    if let Some(ref dir) = config.server.static_dir {
      renderer = renderer.static_files(&config.server.static_prefix, dir);
    }
    Ok(renderer)
  }
}

/* src/server/core/rust/src/template.rs */

//! Page shell that carries rendered markup plus the serialized store state
//! from the server render to client hydration.

use crate::errors::RefetchError;
use crate::escape::escape_json_for_script;

pub const DEFAULT_HTML_MARKER: &str = "<!--refetch:html-->";
pub const DEFAULT_STATE_ID: &str = "__INITIAL_STATE__";

const DEFAULT_SHELL: &str = concat!(
  "<!DOCTYPE html><html><head><meta charset=\"utf-8\"></head>",
  "<body><div id=\"root\"><!--refetch:html--></div></body></html>",
);

#[derive(Debug, Clone)]
pub struct Template {
  shell: String,
  html_marker: String,
  state_id: String,
}

impl Default for Template {
  fn default() -> Self {
    Self::new(DEFAULT_SHELL)
  }
}

impl Template {
  pub fn new(shell: impl Into<String>) -> Self {
    Self {
      shell: shell.into(),
      html_marker: DEFAULT_HTML_MARKER.to_string(),
      state_id: DEFAULT_STATE_ID.to_string(),
    }
  }

  pub fn html_marker(mut self, marker: impl Into<String>) -> Self {
    self.html_marker = marker.into();
    self
  }

  pub fn state_id(mut self, id: impl Into<String>) -> Self {
    self.state_id = id.into();
    self
  }

  pub fn state_script_id(&self) -> &str {
    &self.state_id
  }

  /// Place `html` at the shell's marker and embed `initial_state` as a JSON
  /// data script before `</body>`. A shell without the marker gets the markup
  /// right before `</body>` instead.
  pub fn render_template(&self, html: &str, initial_state: &serde_json::Value) -> String {
    let mut page = if self.shell.contains(&self.html_marker) {
      self.shell.replacen(&self.html_marker, html, 1)
    } else {
      insert_before_body_end(self.shell.clone(), html)
    };

    let json = serde_json::to_string(initial_state).unwrap_or_default();
    let script = format!(
      r#"<script id="{}" type="application/json">{}</script>"#,
      self.state_id,
      escape_json_for_script(&json),
    );
    page = insert_before_body_end(page, &script);
    page
  }
}

fn insert_before_body_end(mut page: String, fragment: &str) -> String {
  if let Some(pos) = page.rfind("</body>") {
    page.insert_str(pos, fragment);
  } else {
    page.push_str(fragment);
  }
  page
}

/// Read back the state embedded by [`Template::render_template`].
/// `Ok(None)` when the page carries no script with that id.
pub fn extract_initial_state(
  page: &str,
  state_id: &str,
) -> Result<Option<serde_json::Value>, RefetchError> {
  let open = format!(r#"<script id="{state_id}" type="application/json">"#);
  let Some(start) = page.find(&open).map(|idx| idx + open.len()) else {
    return Ok(None);
  };
  let Some(len) = page[start..].find("</script>") else {
    return Ok(None);
  };
  Ok(Some(serde_json::from_str(&page[start..start + len])?))
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn renders_markup_and_state() {
    let page = Template::default().render_template("<h1>Hi</h1>", &json!({ "a": 1 }));
    assert!(page.contains(r#"<div id="root"><h1>Hi</h1></div>"#));
    assert!(page.ends_with(
      r#"<script id="__INITIAL_STATE__" type="application/json">{"a":1}</script></body></html>"#
    ));
  }

  #[test]
  fn shell_without_marker_or_body() {
    let page = Template::new("<main></main>").render_template("<p>x</p>", &json!({}));
    assert_eq!(
      page,
      r#"<main></main><p>x</p><script id="__INITIAL_STATE__" type="application/json">{}</script>"#
    );
  }

  #[test]
  fn custom_marker_and_id() {
    let template = Template::new("<body>{{app}}</body>").html_marker("{{app}}").state_id("__data");
    let page = template.render_template("ok", &json!(null));
    assert_eq!(page, r#"<body>ok<script id="__data" type="application/json">null</script></body>"#);
  }

  #[test]
  fn state_survives_hostile_strings() {
    let state = json!({ "title": "</script><script>alert(1)</script>", "name": "caf\u{e9}" });
    let page = Template::default().render_template("", &state);
    assert_eq!(page.matches("</script>").count(), 1);
    let back = extract_initial_state(&page, DEFAULT_STATE_ID).expect("parse");
    assert_eq!(back, Some(state));
  }

  #[test]
  fn extract_missing_script() {
    assert!(extract_initial_state("<html></html>", DEFAULT_STATE_ID).expect("ok").is_none());
  }

  #[test]
  fn extract_malformed_json() {
    let page = r#"<script id="__INITIAL_STATE__" type="application/json">{oops</script>"#;
    assert!(matches!(extract_initial_state(page, DEFAULT_STATE_ID), Err(RefetchError::State(_))));
  }
}

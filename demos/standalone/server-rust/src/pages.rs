/* demos/standalone/server-rust/src/pages.rs */

use refetch::{Location, RefetchError, Store};
use refetch_axum::RenderContext;

pub fn render_page(
  store: &Store,
  location: &Location,
  ctx: &mut RenderContext,
) -> Result<String, RefetchError> {
  let path = location.pathname.as_str();
  if path == "/users" {
    ctx.redirect("/");
    return Ok(String::new());
  }
  if path == "/" {
    let items: String = store
      .slice("users")
      .and_then(|users| users.as_array().cloned())
      .unwrap_or_default()
      .iter()
      .map(|u| format!(r#"<li><a href="/user/{}">{}</a></li>"#, text(&u["id"]), text(&u["name"])))
      .collect();
    return Ok(format!("<h1>Users</h1><ul>{items}</ul>{}", script()));
  }
  if path.starts_with("/user/") {
    return Ok(match store.slice("user").filter(|u| !u.is_null()) {
      Some(user) => format!("<h1>{}</h1><a href=\"/\">Back</a>{}", text(&user["name"]), script()),
      None => {
        ctx.status = Some(404);
        "<h1>No such user</h1>".to_string()
      }
    });
  }
  ctx.status = Some(404);
  Ok("<h1>Not found</h1>".to_string())
}

fn script() -> &'static str {
  r#"<script src="/static/app.js" defer></script>"#
}

// Demo data is plain ASCII; only the markup-significant characters need escaping.
fn text(value: &serde_json::Value) -> String {
  value.as_str().unwrap_or_default().replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

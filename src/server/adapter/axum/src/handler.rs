/* src/server/adapter/axum/src/handler.rs */

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use tower_http::services::ServeDir;

use crate::render::{RenderResult, ServerRenderer};

impl IntoResponse for RenderResult {
  fn into_response(self) -> Response {
    let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match self.url {
      Some(url) => (status, [(header::LOCATION, url)]).into_response(),
      None => {
        (status, [(header::CONTENT_TYPE, "text/html; charset=utf-8")], self.body).into_response()
      }
    }
  }
}

pub(crate) fn build_router(renderer: ServerRenderer) -> Router {
  let mut router = Router::new();
  if let Some((prefix, dir)) = renderer.static_files.clone() {
    router = router.nest_service(&prefix, ServeDir::new(dir));
  }
  router.fallback(handle_page).with_state(Arc::new(renderer))
}

async fn handle_page(
  State(renderer): State<Arc<ServerRenderer>>,
  method: Method,
  uri: Uri,
) -> Response {
  if method != Method::GET && method != Method::HEAD {
    return StatusCode::NOT_FOUND.into_response();
  }
  let url = uri.path_and_query().map_or("/", |pq| pq.as_str());
  renderer.render(url).await.into_response()
}

#[cfg(test)]
mod tests {
  use axum::body::Body;
  use axum::http::Request;
  use http_body_util::BodyExt;
  use refetch::{
    Action, FetcherRoute, FetcherRoutes, Location, RefetchError, Store, Template, loader,
  };
  use tower::ServiceExt;

  use super::*;
  use crate::render::RenderContext;

  fn renderer() -> ServerRenderer {
    let page = |store: &Store, location: &Location, ctx: &mut RenderContext| {
      if location.pathname == "/old" {
        ctx.redirect("/new");
        return Ok(String::new());
      }
      let greeting = store.slice("greeting").and_then(|v| v.as_str().map(String::from));
      Ok::<_, RefetchError>(format!("<p>{}</p>", greeting.unwrap_or_default()))
    };
    ServerRenderer::new(Template::default(), page).routes(|| {
      FetcherRoutes::new(vec![
        FetcherRoute::new(
          "/",
          loader(|store, _| async move {
            store.dispatch(Action::SetSlice { name: "greeting".into(), value: "hello".into() });
            Ok(())
          }),
        )
        .expect("valid"),
      ])
    })
  }

  async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf8")
  }

  #[tokio::test]
  async fn renders_html_page() {
    let router = build_router(renderer());
    let req = Request::builder().uri("/home?x=1").body(Body::empty()).expect("request");
    let response = router.oneshot(req).await.expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
      response.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
      Some("text/html; charset=utf-8")
    );
    let body = body_string(response).await;
    assert!(body.contains("<p>hello</p>"));
    assert!(body.contains(r#""@@serverRender":true"#));
  }

  #[tokio::test]
  async fn redirect_sets_location_header() {
    let router = build_router(renderer());
    let req = Request::builder().uri("/old").body(Body::empty()).expect("request");
    let response = router.oneshot(req).await.expect("response");

    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()), Some("/new"));
  }

  #[tokio::test]
  async fn non_get_is_not_found() {
    let router = build_router(renderer());
    let req = Request::builder().method("POST").uri("/home").body(Body::empty()).expect("request");
    let response = router.oneshot(req).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn serves_static_files_under_prefix() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("app.js"), "console.log(1)").expect("write");
    let router = build_router(renderer().static_files("/static", dir.path()));

    let req = Request::builder().uri("/static/app.js").body(Body::empty()).expect("request");
    let response = router.oneshot(req).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "console.log(1)");
  }

  #[test]
  fn invalid_status_falls_back_to_500() {
    let result = RenderResult { status: 42, body: String::new(), url: None };
    assert_eq!(result.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
  }
}

//! Axum mounting of the admin routes

use crate::core::{Method, QueryDict, RequestContext, RequestError, StarkError, StarkResponse};
use crate::server::urls::SiteUrls;
use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http;
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Largest form body accepted by the admin views
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Build a router serving every admin route
///
/// Each compiled path is registered with axum; the request is then resolved
/// again by [`SiteUrls::dispatch`] so that path arguments reach the view
/// exactly as [`SiteUrls::resolve`] captured them. Unmatched paths fall
/// through to the same handler and come back as a JSON 404.
pub fn build_admin_routes(urls: Arc<SiteUrls>) -> Router {
    let paths: Vec<String> = urls.paths().into_iter().map(str::to_string).collect();

    let mut router: Router<Arc<SiteUrls>> = Router::new();
    for path in &paths {
        router = router.route(path, any(serve_admin));
    }

    router
        .fallback(serve_admin)
        .with_state(urls)
        .layer(TraceLayer::new_for_http())
}

async fn serve_admin(State(urls): State<Arc<SiteUrls>>, request: Request) -> Response {
    match handle(urls, request).await {
        Ok(response) => response.into_response(),
        Err(err) => err.into_response(),
    }
}

async fn handle(urls: Arc<SiteUrls>, request: Request) -> Result<StarkResponse, StarkError> {
    let method = match *request.method() {
        http::Method::GET | http::Method::HEAD => Method::Get,
        http::Method::POST => Method::Post,
        ref other => {
            return Err(RequestError::MethodNotAllowed {
                method: other.to_string(),
            }
            .into());
        }
    };
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let data = match method {
        Method::Get => QueryDict::new(),
        Method::Post => {
            let bytes = to_bytes(request.into_body(), MAX_BODY_BYTES)
                .await
                .map_err(|e| RequestError::MalformedBody {
                    message: e.to_string(),
                })?;
            let body = std::str::from_utf8(&bytes).map_err(|e| RequestError::MalformedBody {
                message: e.to_string(),
            })?;
            QueryDict::parse(body).map_err(|e| RequestError::MalformedBody {
                message: e.to_string(),
            })?
        }
    };

    let ctx = RequestContext::new(urls.clone(), method, &path_and_query, data)?;
    urls.dispatch(ctx).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::core::{FieldKind, FieldMeta, Model, ModelMeta};
    use crate::handler::{HandlerConfig, StarkHandler};
    use crate::server::site::StarkSite;
    use crate::storage::InMemorySource;
    use axum::body::Body;
    use serde::{Deserialize, Serialize};
    use serde_json::Value;
    use std::fmt;
    use std::sync::LazyLock;
    use tower::ServiceExt;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Tag {
        #[serde(default)]
        id: i64,
        label: String,
    }

    impl fmt::Display for Tag {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.label)
        }
    }

    impl Model for Tag {
        fn meta() -> &'static ModelMeta {
            static META: LazyLock<ModelMeta> = LazyLock::new(|| {
                ModelMeta::new("blog", "tag").field(FieldMeta::new("label", FieldKind::Text))
            });
            &META
        }

        fn pk(&self) -> i64 {
            self.id
        }

        fn set_pk(&mut self, pk: i64) {
            self.id = pk;
        }
    }

    fn app(source: InMemorySource<Tag>) -> Router {
        let mut site = StarkSite::with_config(SiteConfig::default());
        site.register_handler(
            StarkHandler::new(source, HandlerConfig::new().list_display(["label"])),
            None,
        )
        .unwrap();
        site.router().unwrap()
    }

    #[tokio::test]
    async fn test_form_body_reaches_the_view() {
        let tags = InMemorySource::<Tag>::new();
        let response = app(tags.clone())
            .oneshot(
                http::Request::builder()
                    .method(http::Method::POST)
                    .uri("/stark/blog/tag/add/")
                    .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("label=rust%20tips"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), http::StatusCode::FOUND);
        assert_eq!(response.headers()[http::header::LOCATION], "/stark/blog/tag/list/");
        assert_eq!(tags.len(), 1);
    }

    #[tokio::test]
    async fn test_head_is_served_like_get() {
        let response = app(InMemorySource::new())
            .oneshot(
                http::Request::builder()
                    .method(http::Method::HEAD)
                    .uri("/stark/blog/tag/list/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), http::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_utf8_body_is_rejected() {
        let response = app(InMemorySource::new())
            .oneshot(
                http::Request::builder()
                    .method(http::Method::POST)
                    .uri("/stark/blog/tag/add/")
                    .body(Body::from(vec![0xff, 0xfe]))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), http::StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "MALFORMED_BODY");
    }
}

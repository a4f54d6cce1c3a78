//! View responses
//!
//! Templates are outside the admin: a render response carries the template
//! name and its context, and is served as JSON.

use crate::core::error::StarkError;
use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

/// Header carrying the template name of a render response
pub const TEMPLATE_HEADER: &str = "x-stark-template";

#[derive(Debug, Clone, PartialEq)]
pub enum StarkResponse {
    /// Render `template` with `context`
    Render {
        template: &'static str,
        context: Value,
    },
    /// Redirect to a URL
    Redirect(String),
    /// Plain user-facing message
    Message(String),
}

impl StarkResponse {
    pub fn render(template: &'static str, context: Value) -> Self {
        StarkResponse::Render { template, context }
    }

    pub fn template(&self) -> Option<&'static str> {
        match self {
            StarkResponse::Render { template, .. } => Some(template),
            _ => None,
        }
    }

    pub fn context(&self) -> Option<&Value> {
        match self {
            StarkResponse::Render { context, .. } => Some(context),
            _ => None,
        }
    }

    pub fn redirect_url(&self) -> Option<&str> {
        match self {
            StarkResponse::Redirect(url) => Some(url),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            StarkResponse::Message(text) => Some(text),
            _ => None,
        }
    }
}

/// Percent-encode every byte a header value cannot carry verbatim
///
/// A `_filter` restored into a redirect may hold decoded non-ASCII text.
fn encode_location(url: &str) -> String {
    let mut encoded = String::with_capacity(url.len());
    for byte in url.bytes() {
        if byte.is_ascii_graphic() {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    encoded
}

impl IntoResponse for StarkResponse {
    fn into_response(self) -> Response {
        match self {
            StarkResponse::Render { template, context } => {
                let mut response = Json(context).into_response();
                response
                    .headers_mut()
                    .insert(TEMPLATE_HEADER, HeaderValue::from_static(template));
                response
            }
            StarkResponse::Redirect(url) => match HeaderValue::from_str(&encode_location(&url)) {
                Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "unusable redirect target");
                    StarkError::Internal(format!("Invalid redirect target: {}", e)).into_response()
                }
            },
            StarkResponse::Message(text) => text.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accessors() {
        let r = StarkResponse::render("stark/change.html", json!({"form": {}}));
        assert_eq!(r.template(), Some("stark/change.html"));
        assert!(r.context().is_some());
        assert_eq!(r.redirect_url(), None);

        let r = StarkResponse::Redirect("/stark/app/host/list/".to_string());
        assert_eq!(r.redirect_url(), Some("/stark/app/host/list/"));
        assert_eq!(r.message(), None);
    }

    #[test]
    fn test_redirect_into_response() {
        let response = StarkResponse::Redirect("/a/?q=1".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/a/?q=1");
    }

    #[test]
    fn test_redirect_with_non_ascii_query_is_encoded() {
        let response = StarkResponse::Redirect("/a/?q=é x".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/a/?q=%C3%A9%20x");
    }

    #[test]
    fn test_render_into_response_sets_template_header() {
        let response = StarkResponse::render("stark/delete.html", json!({})).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[TEMPLATE_HEADER], "stark/delete.html");
    }
}

//! Request-scoped context threaded through every view
//!
//! Nothing about the current request is ever stored on a shared handler.
//! Views, bulk actions, column renderers and URL helpers all receive the
//! [`RequestContext`] explicitly.

use crate::core::error::{RequestError, StarkError};
use crate::core::querydict::QueryDict;
use crate::server::urls::SiteUrls;
use std::sync::Arc;

/// HTTP method as far as the admin views care
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// One incoming admin request
#[derive(Clone)]
pub struct RequestContext {
    pub method: Method,
    /// Path without the query string
    pub path: String,
    /// Query-string parameters
    pub query: QueryDict,
    /// Form-encoded body parameters (empty for GET)
    pub data: QueryDict,
    site: Arc<SiteUrls>,
}

impl RequestContext {
    /// Build a context from a path that may carry a query string
    pub fn new(
        site: Arc<SiteUrls>,
        method: Method,
        path_and_query: &str,
        data: QueryDict,
    ) -> Result<Self, StarkError> {
        let (path, query) = match path_and_query.split_once('?') {
            Some((path, query)) => (path, query),
            None => (path_and_query, ""),
        };
        let query = QueryDict::parse(query).map_err(|e| RequestError::MalformedBody {
            message: e.to_string(),
        })?;
        Ok(Self {
            method,
            path: path.to_string(),
            query,
            data,
            site,
        })
    }

    pub fn get(site: Arc<SiteUrls>, path_and_query: &str) -> Result<Self, StarkError> {
        Self::new(site, Method::Get, path_and_query, QueryDict::new())
    }

    pub fn post(
        site: Arc<SiteUrls>,
        path_and_query: &str,
        data: QueryDict,
    ) -> Result<Self, StarkError> {
        Self::new(site, Method::Post, path_and_query, data)
    }

    pub fn is_post(&self) -> bool {
        self.method == Method::Post
    }

    /// The site this request was routed through
    pub fn site(&self) -> &Arc<SiteUrls> {
        &self.site
    }

    /// Path plus the current query string
    pub fn full_path(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query.urlencode())
        }
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("data", &self.data)
            .finish()
    }
}

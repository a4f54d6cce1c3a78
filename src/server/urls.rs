//! Named routes, reverse lookup and dispatch
//!
//! Route patterns are relative paths with `{name}` placeholders, e.g.
//! `change/{pk}/`. A [`RouteGroup`] puts a prefix in front of its routes and
//! [`SiteUrls`] mounts every group under the site's mount path. Routes are
//! looked up by name through [`SiteUrls::reverse`] and matched against a path
//! through [`SiteUrls::resolve`].

use crate::config::SiteConfig;
use crate::core::{
    ConfigError, Method, QueryDict, RequestContext, RequestError, SourceRegistry, StarkError,
    StarkResponse,
};
use crate::server::router::build_admin_routes;
use axum::Router;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, LazyLock};
use tracing::debug;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
});

pub type ViewFuture = BoxFuture<'static, Result<StarkResponse, StarkError>>;

/// View bound to a route
pub type ViewFn = Arc<dyn Fn(RequestContext, RouteArgs) -> ViewFuture + Send + Sync>;

/// Values captured from a path, keyed by placeholder name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteArgs(IndexMap<String, String>);

impl RouteArgs {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// The `pk` argument as a primary key
    pub fn pk(&self) -> Result<i64, StarkError> {
        let value = self.get("pk").unwrap_or_default();
        value.parse().map_err(|_| {
            RequestError::InvalidPrimaryKey {
                value: value.to_string(),
            }
            .into()
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A named view at a relative path
#[derive(Clone)]
pub struct Route {
    pub pattern: String,
    pub name: String,
    view: ViewFn,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .field("name", &self.name)
            .finish()
    }
}

impl Route {
    pub fn new<F, Fut>(pattern: impl Into<String>, name: impl Into<String>, view: F) -> Self
    where
        F: Fn(RequestContext, RouteArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<StarkResponse, StarkError>> + Send + 'static,
    {
        Self {
            pattern: pattern.into(),
            name: name.into(),
            view: Arc::new(move |ctx: RequestContext, args: RouteArgs| -> ViewFuture {
                Box::pin(view(ctx, args))
            }),
        }
    }

    pub fn call(&self, ctx: RequestContext, args: RouteArgs) -> ViewFuture {
        (self.view)(ctx, args)
    }
}

/// Routes sharing a path prefix
#[derive(Debug, Clone)]
pub struct RouteGroup {
    pub prefix: String,
    pub routes: Vec<Route>,
}

impl RouteGroup {
    pub fn new(prefix: impl Into<String>, routes: Vec<Route>) -> Self {
        Self {
            prefix: prefix.into(),
            routes,
        }
    }
}

struct CompiledRoute {
    group: usize,
    route: usize,
    path: String,
    matcher: Regex,
}

/// The admin's URL configuration
///
/// Built once by the site from its registrations; shared by every request.
pub struct SiteUrls {
    patterns: Vec<RouteGroup>,
    app_name: String,
    namespace: String,
    mount_path: String,
    sources: SourceRegistry,
    compiled: Vec<CompiledRoute>,
    names: HashMap<String, usize>,
}

impl std::fmt::Debug for SiteUrls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteUrls")
            .field("app_name", &self.app_name)
            .field("namespace", &self.namespace)
            .field("mount_path", &self.mount_path)
            .field("routes", &self.paths())
            .finish()
    }
}

impl SiteUrls {
    /// Compile the route table; route names and paths must be unique
    pub fn new(
        config: &SiteConfig,
        patterns: Vec<RouteGroup>,
        sources: SourceRegistry,
    ) -> Result<Self, StarkError> {
        let mut compiled = Vec::new();
        let mut names = HashMap::new();
        let mut shapes: HashMap<String, String> = HashMap::new();

        for (group_idx, group) in patterns.iter().enumerate() {
            for (route_idx, route) in group.routes.iter().enumerate() {
                let path = format!("{}{}{}", config.mount_path, group.prefix, route.pattern);
                if names.insert(route.name.clone(), compiled.len()).is_some() {
                    return Err(ConfigError::DuplicateRouteName {
                        name: route.name.clone(),
                    }
                    .into());
                }
                // `change/{pk}/` and `change/{id}/` collide once mounted
                let shape = PLACEHOLDER.replace_all(&path, "{}").into_owned();
                if let Some(first) = shapes.insert(shape, route.name.clone()) {
                    return Err(ConfigError::DuplicateRoutePath {
                        path,
                        first,
                        second: route.name.clone(),
                    }
                    .into());
                }
                compiled.push(CompiledRoute {
                    group: group_idx,
                    route: route_idx,
                    matcher: compile_matcher(&path)?,
                    path,
                });
            }
        }

        debug!(routes = compiled.len(), namespace = %config.namespace, "compiled admin routes");
        Ok(Self {
            patterns,
            app_name: config.app_name.clone(),
            namespace: config.namespace.clone(),
            mount_path: config.mount_path.clone(),
            sources,
            compiled,
            names,
        })
    }

    /// `(patterns, app_name, namespace)` for mounting in an outer router
    pub fn urls(&self) -> (&[RouteGroup], &str, &str) {
        (&self.patterns, &self.app_name, &self.namespace)
    }

    pub fn patterns(&self) -> &[RouteGroup] {
        &self.patterns
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn mount_path(&self) -> &str {
        &self.mount_path
    }

    /// Sources available to relation facets
    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    /// Full path template of every route, in registration order
    pub fn paths(&self) -> Vec<&str> {
        self.compiled.iter().map(|c| c.path.as_str()).collect()
    }

    /// Names of every route, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.compiled
            .iter()
            .map(|c| self.route(c).name.as_str())
            .collect()
    }

    fn route(&self, compiled: &CompiledRoute) -> &Route {
        &self.patterns[compiled.group].routes[compiled.route]
    }

    /// Path of a named route
    ///
    /// `name` may be qualified with this site's namespace (`stark:app_host_list`).
    /// Positional `args` fill the placeholders in order.
    pub fn reverse(&self, name: &str, args: &[&str]) -> Result<String, StarkError> {
        let local = match name.split_once(':') {
            Some((namespace, local)) if namespace == self.namespace => local,
            Some(_) => {
                return Err(ConfigError::UnknownRoute {
                    name: name.to_string(),
                }
                .into());
            }
            None => name,
        };
        let compiled = self
            .names
            .get(local)
            .map(|&idx| &self.compiled[idx])
            .ok_or_else(|| ConfigError::UnknownRoute {
                name: name.to_string(),
            })?;

        let expected = PLACEHOLDER.find_iter(&compiled.path).count();
        if expected != args.len() {
            return Err(ConfigError::ArgumentMismatch {
                name: name.to_string(),
                expected,
                given: args.len(),
            }
            .into());
        }

        let mut values = args.iter();
        Ok(PLACEHOLDER
            .replace_all(&compiled.path, |_: &regex::Captures<'_>| {
                values.next().map(|v| v.to_string()).unwrap_or_default()
            })
            .into_owned())
    }

    /// The route matching a path and its captured arguments
    pub fn resolve(&self, path: &str) -> Option<(&Route, RouteArgs)> {
        self.compiled.iter().find_map(|compiled| {
            let caps = compiled.matcher.captures(path)?;
            let args = compiled
                .matcher
                .capture_names()
                .flatten()
                .filter_map(|name| Some((name.to_string(), caps.name(name)?.as_str().to_string())))
                .collect();
            Some((self.route(compiled), RouteArgs(args)))
        })
    }

    /// Route the request to its view
    pub async fn dispatch(&self, ctx: RequestContext) -> Result<StarkResponse, StarkError> {
        let Some((route, args)) = self.resolve(&ctx.path) else {
            return Err(RequestError::RouteNotFound {
                path: ctx.path.clone(),
            }
            .into());
        };
        debug!(route = %route.name, method = ctx.method.as_str(), path = %ctx.path, "dispatch");
        route.call(ctx, args).await
    }

    /// Build a GET request against this site
    pub fn get(self: &Arc<Self>, path_and_query: &str) -> Result<RequestContext, StarkError> {
        RequestContext::get(self.clone(), path_and_query)
    }

    /// Build a POST request against this site
    pub fn post(
        self: &Arc<Self>,
        path_and_query: &str,
        data: QueryDict,
    ) -> Result<RequestContext, StarkError> {
        RequestContext::new(self.clone(), Method::Post, path_and_query, data)
    }

    /// Axum router serving every route of this site
    pub fn router(self: &Arc<Self>) -> Router {
        build_admin_routes(self.clone())
    }
}

fn compile_matcher(path: &str) -> Result<Regex, StarkError> {
    let mut pattern = String::from("^");
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(path) {
        let Some(whole) = caps.get(0) else { continue };
        pattern.push_str(&regex::escape(&path[last..whole.start()]));
        pattern.push_str(&format!("(?P<{}>[^/]+)", &caps[1]));
        last = whole.end();
    }
    pattern.push_str(&regex::escape(&path[last..]));
    pattern.push('$');
    Regex::new(&pattern)
        .map_err(|e| StarkError::Internal(format!("Invalid route pattern '{}': {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(pattern: &str, name: &str) -> Route {
        let label = name.to_string();
        Route::new(pattern, name, move |_, args: RouteArgs| {
            let label = label.clone();
            async move {
                Ok(StarkResponse::Message(format!(
                    "{} {}",
                    label,
                    args.get("pk").unwrap_or("-")
                )))
            }
        })
    }

    fn site() -> Arc<SiteUrls> {
        let groups = vec![
            RouteGroup::new(
                "app/host/",
                vec![route("list/", "app_host_list"), route("change/{pk}/", "app_host_change")],
            ),
            RouteGroup::new("app/host/private/", vec![route("list/", "app_host_private_list")]),
        ];
        Arc::new(SiteUrls::new(&SiteConfig::default(), groups, SourceRegistry::new()).unwrap())
    }

    #[test]
    fn test_reverse() {
        let urls = site();
        assert_eq!(urls.reverse("stark:app_host_list", &[]).unwrap(), "/stark/app/host/list/");
        assert_eq!(
            urls.reverse("stark:app_host_change", &["7"]).unwrap(),
            "/stark/app/host/change/7/"
        );
        assert_eq!(
            urls.reverse("app_host_private_list", &[]).unwrap(),
            "/stark/app/host/private/list/"
        );
    }

    #[test]
    fn test_reverse_errors() {
        let urls = site();
        assert!(matches!(
            urls.reverse("stark:nope", &[]),
            Err(StarkError::Config(ConfigError::UnknownRoute { .. }))
        ));
        assert!(matches!(
            urls.reverse("other:app_host_list", &[]),
            Err(StarkError::Config(ConfigError::UnknownRoute { .. }))
        ));
        assert!(matches!(
            urls.reverse("stark:app_host_change", &[]),
            Err(StarkError::Config(ConfigError::ArgumentMismatch { expected: 1, given: 0, .. }))
        ));
    }

    #[test]
    fn test_resolve() {
        let urls = site();
        let (route, args) = urls.resolve("/stark/app/host/change/12/").unwrap();
        assert_eq!(route.name, "app_host_change");
        assert_eq!(args.get("pk"), Some("12"));
        assert_eq!(args.pk().unwrap(), 12);

        assert!(urls.resolve("/stark/app/host/change/12").is_none());
        assert!(urls.resolve("/stark/app/host/change/1/2/").is_none());
        assert!(urls.resolve("/other/").is_none());
    }

    #[test]
    fn test_non_numeric_pk() {
        let urls = site();
        let (_, args) = urls.resolve("/stark/app/host/change/abc/").unwrap();
        assert!(matches!(
            args.pk(),
            Err(StarkError::Request(RequestError::InvalidPrimaryKey { .. }))
        ));
    }

    #[test]
    fn test_duplicate_route_names() {
        let groups = vec![
            RouteGroup::new("a/", vec![route("list/", "same")]),
            RouteGroup::new("b/", vec![route("list/", "same")]),
        ];
        let err = SiteUrls::new(&SiteConfig::default(), groups, SourceRegistry::new()).unwrap_err();
        assert!(matches!(err, StarkError::Config(ConfigError::DuplicateRouteName { .. })));
    }

    #[test]
    fn test_duplicate_route_paths() {
        let groups = vec![RouteGroup::new(
            "app/host/",
            vec![route("change/{pk}/", "app_host_change"), route("change/{id}/", "app_host_edit")],
        )];
        let err = SiteUrls::new(&SiteConfig::default(), groups, SourceRegistry::new()).unwrap_err();
        assert!(matches!(
            err,
            StarkError::Config(ConfigError::DuplicateRoutePath { ref first, ref second, .. })
                if first == "app_host_change" && second == "app_host_edit"
        ));
        assert_eq!(err.error_code(), "DUPLICATE_ROUTE_PATH");
    }

    #[tokio::test]
    async fn test_dispatch() {
        let urls = site();
        let response = urls.dispatch(urls.get("/stark/app/host/change/3/").unwrap()).await.unwrap();
        assert_eq!(response.message(), Some("app_host_change 3"));

        let err = urls.dispatch(urls.get("/stark/missing/").unwrap()).await.unwrap_err();
        assert!(matches!(err, StarkError::Request(RequestError::RouteNotFound { .. })));
    }
}

//! Route names and URL building for a handler

use crate::core::{Model, ModelMeta, QueryDict, RequestContext, StarkError};
use crate::handler::StarkHandler;
use crate::server::urls::{Route, SiteUrls};
use std::sync::Arc;

/// Query parameter carrying a captured list-view query string
pub const FILTER_PARAM: &str = "_filter";

/// Type-erased handler as seen by the site registry
pub trait AdminHandler: Send + Sync {
    fn model_meta(&self) -> &'static ModelMeta;

    fn prefix(&self) -> Option<&str>;

    /// The four CRUD routes followed by any extra routes
    fn get_urls(self: Arc<Self>) -> Vec<Route>;
}

impl<M: Model> StarkHandler<M> {
    /// `{app}_{model}[_{prefix}]_{param}`
    pub fn get_url_name(&self, param: &str) -> String {
        let meta = M::meta();
        match &self.prefix {
            Some(prefix) => format!(
                "{}_{}_{}_{}",
                meta.app_label, meta.model_name, prefix, param
            ),
            None => format!("{}_{}_{}", meta.app_label, meta.model_name, param),
        }
    }

    pub fn get_list_url_name(&self) -> String {
        self.get_url_name("list")
    }

    pub fn get_add_url_name(&self) -> String {
        self.get_url_name("add")
    }

    pub fn get_change_url_name(&self) -> String {
        self.get_url_name("change")
    }

    pub fn get_delete_url_name(&self) -> String {
        self.get_url_name("delete")
    }

    /// URL of a named route
    ///
    /// With a request the current query string rides along in `_filter`, so
    /// the destination can send the user back to the same list state.
    pub fn reverse_url(
        &self,
        site: &SiteUrls,
        name: &str,
        args: &[&str],
        request: Option<&RequestContext>,
    ) -> Result<String, StarkError> {
        let base_url = site.reverse(&format!("{}:{}", site.namespace(), name), args)?;
        let Some(ctx) = request else {
            return Ok(base_url);
        };
        let mut carried = QueryDict::new();
        carried.set(FILTER_PARAM, ctx.query.urlencode());
        Ok(format!("{}?{}", base_url, carried.urlencode()))
    }

    /// List URL with the captured `_filter` query string restored verbatim
    pub fn reverse_list_url(&self, ctx: &RequestContext) -> Result<String, StarkError> {
        let site = ctx.site();
        let base_url = site.reverse(
            &format!("{}:{}", site.namespace(), self.get_list_url_name()),
            &[],
        )?;
        match ctx.query.get(FILTER_PARAM) {
            Some(param) if !param.is_empty() => Ok(format!("{}?{}", base_url, param)),
            _ => Ok(base_url),
        }
    }
}

impl<M: Model> AdminHandler for StarkHandler<M> {
    fn model_meta(&self) -> &'static ModelMeta {
        M::meta()
    }

    fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    fn get_urls(self: Arc<Self>) -> Vec<Route> {
        let list = self.clone();
        let add = self.clone();
        let change = self.clone();
        let delete = self.clone();

        let mut patterns = vec![
            Route::new("list/", self.get_list_url_name(), move |ctx, _| {
                let handler = list.clone();
                async move { handler.changelist_view(&ctx).await }
            }),
            Route::new("add/", self.get_add_url_name(), move |ctx, _| {
                let handler = add.clone();
                async move { handler.add_view(&ctx).await }
            }),
            Route::new("change/{pk}/", self.get_change_url_name(), move |ctx, args| {
                let handler = change.clone();
                async move { handler.change_view(&ctx, args.pk()?).await }
            }),
            Route::new("delete/{pk}/", self.get_delete_url_name(), move |ctx, args| {
                let handler = delete.clone();
                async move { handler.delete_view(&ctx, args.pk()?).await }
            }),
        ];
        patterns.extend(self.hooks.extra_urls(&self));
        patterns
    }
}

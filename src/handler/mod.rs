//! Generic CRUD handler
//!
//! A [`StarkHandler`] serves the list, add, change and delete views of one
//! model. Its behavior comes from a [`HandlerConfig`] value handed to the
//! constructor, and every `get_*` lookup goes through a [`HandlerHooks`]
//! implementation so a handler can vary its configuration per request.
//!
//! The handler is shared by every request routed to it. Request state is
//! never stored on it; views receive a [`RequestContext`] instead.

pub mod actions;
pub mod columns;
pub mod html;
pub mod options;
pub mod urls;
pub mod views;

pub use actions::{Action, BulkAction, MultiDelete};
pub use columns::{Column, display_check, display_del, display_edit, get_choice_text};
pub use options::{FacetItem, FacetLink, FacetOption, FacetRow};
pub use urls::AdminHandler;
pub use views::{AddButton, ChangeList};

use crate::config::SiteConfig;
use crate::core::{DataSource, Model, RequestContext, StarkError};
use crate::forms::{ModelFormSpec, StarkModelForm};
use crate::server::urls::Route;
use async_trait::async_trait;
use std::sync::Arc;

/// Declarative configuration of a handler
pub struct HandlerConfig<M: Model> {
    /// Columns of the list view; empty shows each row's string form
    pub list_display: Vec<Column<M>>,
    /// Ordering rules such as `"-id"`; empty orders by descending primary key
    pub order_list: Vec<String>,
    /// Lookups matched against `q`, e.g. `"name__contains"`
    pub search_list: Vec<String>,
    pub search_group: Vec<FacetOption>,
    pub action_list: Vec<BulkAction<M>>,
    /// Rows per page; the site default applies when unset
    pub per_page_count: Option<usize>,
    pub has_add_btn: bool,
    /// Form used by add and change; all editable fields when unset
    pub model_form_class: Option<ModelFormSpec<M>>,
}

impl<M: Model> Clone for HandlerConfig<M> {
    fn clone(&self) -> Self {
        Self {
            list_display: self.list_display.clone(),
            order_list: self.order_list.clone(),
            search_list: self.search_list.clone(),
            search_group: self.search_group.clone(),
            action_list: self.action_list.clone(),
            per_page_count: self.per_page_count,
            has_add_btn: self.has_add_btn,
            model_form_class: self.model_form_class.clone(),
        }
    }
}

impl<M: Model> Default for HandlerConfig<M> {
    fn default() -> Self {
        Self {
            list_display: Vec::new(),
            order_list: Vec::new(),
            search_list: Vec::new(),
            search_group: Vec::new(),
            action_list: Vec::new(),
            per_page_count: None,
            has_add_btn: true,
            model_form_class: None,
        }
    }
}

impl<M: Model> HandlerConfig<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list_display<C: Into<Column<M>>>(mut self, columns: impl IntoIterator<Item = C>) -> Self {
        self.list_display = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_list<S: Into<String>>(mut self, rules: impl IntoIterator<Item = S>) -> Self {
        self.order_list = rules.into_iter().map(Into::into).collect();
        self
    }

    pub fn search_list<S: Into<String>>(mut self, lookups: impl IntoIterator<Item = S>) -> Self {
        self.search_list = lookups.into_iter().map(Into::into).collect();
        self
    }

    pub fn search_group(mut self, options: impl IntoIterator<Item = FacetOption>) -> Self {
        self.search_group = options.into_iter().collect();
        self
    }

    pub fn action_list(mut self, actions: impl IntoIterator<Item = BulkAction<M>>) -> Self {
        self.action_list = actions.into_iter().collect();
        self
    }

    pub fn per_page_count(mut self, per_page: usize) -> Self {
        self.per_page_count = Some(per_page);
        self
    }

    pub fn has_add_btn(mut self, show: bool) -> Self {
        self.has_add_btn = show;
        self
    }

    pub fn model_form_class(mut self, form: ModelFormSpec<M>) -> Self {
        self.model_form_class = Some(form);
        self
    }
}

/// Per-request overrides of a handler's configuration
///
/// Every method has a default that reads the [`HandlerConfig`]. Override the
/// ones that depend on the request, or `save` to fill in values the form does
/// not collect.
#[async_trait]
pub trait HandlerHooks<M: Model>: Send + Sync + 'static {
    fn get_list_display(&self, config: &HandlerConfig<M>, _ctx: &RequestContext) -> Vec<Column<M>> {
        config.list_display.clone()
    }

    fn get_order_list(&self, config: &HandlerConfig<M>, _ctx: &RequestContext) -> Vec<String> {
        if config.order_list.is_empty() {
            vec![format!("-{}", M::meta().pk_field)]
        } else {
            config.order_list.clone()
        }
    }

    fn get_search_list(&self, config: &HandlerConfig<M>, _ctx: &RequestContext) -> Vec<String> {
        config.search_list.clone()
    }

    fn get_search_group(&self, config: &HandlerConfig<M>, _ctx: &RequestContext) -> Vec<FacetOption> {
        config.search_group.clone()
    }

    fn get_action_list(&self, config: &HandlerConfig<M>, _ctx: &RequestContext) -> Vec<BulkAction<M>> {
        config.action_list.clone()
    }

    fn has_add_btn(&self, config: &HandlerConfig<M>, _ctx: &RequestContext) -> bool {
        config.has_add_btn
    }

    fn get_model_form_class(&self, config: &HandlerConfig<M>, _ctx: &RequestContext) -> ModelFormSpec<M> {
        config.model_form_class.clone().unwrap_or_else(ModelFormSpec::all)
    }

    /// Persist a validated form
    async fn save(
        &self,
        handler: &StarkHandler<M>,
        _ctx: &RequestContext,
        form: &mut StarkModelForm<M>,
        _is_update: bool,
    ) -> Result<M, StarkError> {
        form.save(handler.source().as_ref()).await
    }

    /// Routes served next to the four CRUD views
    fn extra_urls(&self, _handler: &Arc<StarkHandler<M>>) -> Vec<Route> {
        Vec::new()
    }
}

/// Hooks that only read the configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl<M: Model> HandlerHooks<M> for DefaultHooks {}

/// CRUD views for one model
pub struct StarkHandler<M: Model> {
    source: Arc<dyn DataSource<M>>,
    config: HandlerConfig<M>,
    hooks: Arc<dyn HandlerHooks<M>>,
    prefix: Option<String>,
    default_per_page: usize,
    max_pager: usize,
}

impl<M: Model> StarkHandler<M> {
    pub fn new(source: impl DataSource<M> + 'static, config: HandlerConfig<M>) -> Self {
        Self::from_arc(Arc::new(source), config)
    }

    /// Handler over a source that is shared with other code
    pub fn from_arc(source: Arc<dyn DataSource<M>>, config: HandlerConfig<M>) -> Self {
        let defaults = SiteConfig::default();
        Self {
            source,
            config,
            hooks: Arc::new(DefaultHooks),
            prefix: None,
            default_per_page: defaults.per_page,
            max_pager: defaults.max_pager,
        }
    }

    pub fn with_hooks(mut self, hooks: impl HandlerHooks<M>) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    /// Attach to a site under an optional URL prefix
    pub(crate) fn bind(&mut self, prefix: Option<String>, site: &SiteConfig) {
        self.prefix = prefix;
        self.default_per_page = site.per_page;
        self.max_pager = site.max_pager;
    }

    pub fn source(&self) -> &Arc<dyn DataSource<M>> {
        &self.source
    }

    pub fn config(&self) -> &HandlerConfig<M> {
        &self.config
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn get_list_display(&self, ctx: &RequestContext) -> Vec<Column<M>> {
        self.hooks.get_list_display(&self.config, ctx)
    }

    pub fn get_order_list(&self, ctx: &RequestContext) -> Vec<String> {
        self.hooks.get_order_list(&self.config, ctx)
    }

    pub fn get_search_list(&self, ctx: &RequestContext) -> Vec<String> {
        self.hooks.get_search_list(&self.config, ctx)
    }

    pub fn get_search_group(&self, ctx: &RequestContext) -> Vec<FacetOption> {
        self.hooks.get_search_group(&self.config, ctx)
    }

    pub fn get_action_list(&self, ctx: &RequestContext) -> Vec<BulkAction<M>> {
        self.hooks.get_action_list(&self.config, ctx)
    }

    pub fn get_model_form_class(&self, ctx: &RequestContext) -> ModelFormSpec<M> {
        self.hooks.get_model_form_class(&self.config, ctx)
    }

    pub fn per_page(&self) -> usize {
        self.config.per_page_count.unwrap_or(self.default_per_page)
    }

    pub fn max_pager(&self) -> usize {
        self.max_pager
    }
}

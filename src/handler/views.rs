//! The four CRUD views

use crate::core::{
    Condition, Lookup, Model, Pagination, PageLink, QuerySet, RequestContext, StarkError,
    StarkResponse,
};
use crate::forms::StarkModelForm;
use crate::handler::html::escape;
use crate::handler::{FacetOption, FacetRow, StarkHandler};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

pub const CHANGE_LIST_TEMPLATE: &str = "stark/change_list.html";
pub const CHANGE_TEMPLATE: &str = "stark/change.html";
pub const DELETE_TEMPLATE: &str = "stark/delete.html";

/// Shown when the change view is asked for a row that does not exist
pub const CHANGE_NOT_FOUND: &str = "The record to edit does not exist, please choose again.";

/// Link to the add view
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AddButton {
    pub url: String,
    pub html: String,
}

/// Page state of the list view
#[derive(Debug, Clone, Serialize)]
pub struct PageState {
    #[serde(flatten)]
    pub meta: Pagination,
    pub links: Vec<PageLink>,
}

/// Render payload of the list view
#[derive(Debug, Clone, Serialize)]
pub struct ChangeList {
    pub header_list: Vec<String>,
    pub body_list: Vec<Vec<Value>>,
    pub pagination: PageState,
    pub add_btn: Option<AddButton>,
    pub search_list: Vec<String>,
    pub search_value: String,
    /// Action name to label
    pub action_dict: IndexMap<String, String>,
    pub search_group_row_list: Vec<FacetRow>,
}

impl<M: Model> StarkHandler<M> {
    pub fn get_add_btn(&self, ctx: &RequestContext) -> Result<Option<AddButton>, StarkError> {
        if !self.hooks.has_add_btn(&self.config, ctx) {
            return Ok(None);
        }
        let url = self.reverse_url(ctx.site(), &self.get_add_url_name(), &[], Some(ctx))?;
        let html = format!("<a class='btn btn-primary' href='{}'>Add</a>", escape(&url));
        Ok(Some(AddButton { url, html }))
    }

    /// OR of every search lookup against `q`; unrestricted when either is empty
    pub fn get_search_condition(&self, search_list: &[String], search_value: &str) -> Condition {
        if search_value.is_empty() || search_list.is_empty() {
            return Condition::all();
        }
        Condition::Or(
            search_list
                .iter()
                .map(|key| Condition::Lookup(Lookup::parse(key, search_value)))
                .collect(),
        )
    }

    /// AND of the active facet parameters
    pub fn get_search_group_condition(
        &self,
        search_group: &[FacetOption],
        ctx: &RequestContext,
    ) -> Condition {
        search_group
            .iter()
            .filter_map(|option| option.active_condition(ctx))
            .fold(Condition::all(), Condition::and)
    }

    pub async fn changelist_view(&self, ctx: &RequestContext) -> Result<StarkResponse, StarkError> {
        let meta = M::meta();

        let list_display = self.get_list_display(ctx);
        let header_list = if list_display.is_empty() {
            vec![meta.model_name.clone()]
        } else {
            list_display
                .iter()
                .map(|column| column.header(meta, ctx))
                .collect::<Result<Vec<_>, _>>()?
        };

        let search_group = self.get_search_group(ctx);
        let mut search_group_row_list = Vec::with_capacity(search_group.len());
        for option in &search_group {
            search_group_row_list.push(option.get_queryset_or_tuple(meta, ctx).await?);
        }

        let action_list = self.get_action_list(ctx);
        let action_dict: IndexMap<String, String> = action_list
            .iter()
            .map(|action| (action.name.clone(), action.text.clone()))
            .collect();
        if ctx.is_post() {
            if let Some(name) = ctx.data.get("action").filter(|name| !name.is_empty()) {
                match action_list.iter().find(|action| action.name == name) {
                    Some(action) => {
                        if let Some(response) = action.run(self, ctx).await? {
                            return Ok(response);
                        }
                    }
                    None => debug!(action = name, "ignoring unknown bulk action"),
                }
            }
        }

        let search_list = self.get_search_list(ctx);
        let search_value = ctx.query.get("q").unwrap_or_default().to_string();
        let order_list = self.get_order_list(ctx);
        let queryset = QuerySet::all()
            .filter(self.get_search_condition(&search_list, &search_value))
            .filter(self.get_search_group_condition(&search_group, ctx))
            .order_by(&order_list);

        let all_count = self.source.count(&queryset).await?;
        let pagination = Pagination::new(
            ctx.query.get("page"),
            all_count,
            ctx.path.clone(),
            ctx.query.clone(),
            self.per_page(),
            self.max_pager(),
        );
        let data_list = self
            .source
            .fetch(&queryset.slice(pagination.start(), pagination.end()))
            .await?;
        debug!(
            model = %meta.key(),
            total = all_count,
            page = pagination.page,
            rows = data_list.len(),
            "change list"
        );

        let mut body_list = Vec::with_capacity(data_list.len());
        for row in &data_list {
            if list_display.is_empty() {
                body_list.push(vec![Value::String(row.to_string())]);
                continue;
            }
            let cells = list_display
                .iter()
                .map(|column| column.cell(self, ctx, row))
                .collect::<Result<Vec<_>, _>>()?;
            body_list.push(cells);
        }

        let changelist = ChangeList {
            header_list,
            body_list,
            pagination: PageState {
                links: pagination.page_links(),
                meta: pagination,
            },
            add_btn: self.get_add_btn(ctx)?,
            search_list,
            search_value,
            action_dict,
            search_group_row_list,
        };
        let context = serde_json::to_value(&changelist)
            .map_err(|e| StarkError::Internal(format!("Failed to serialize change list: {}", e)))?;
        Ok(StarkResponse::render(CHANGE_LIST_TEMPLATE, context))
    }

    pub async fn add_view(&self, ctx: &RequestContext) -> Result<StarkResponse, StarkError> {
        let spec = self.get_model_form_class(ctx);
        if !ctx.is_post() {
            let form = StarkModelForm::unbound(spec);
            return render_form(&form);
        }

        let mut form = StarkModelForm::bound(spec, ctx.data.clone(), None);
        if form.is_valid()? {
            let saved = self.hooks.save(self, ctx, &mut form, false).await?;
            debug!(model = %M::meta().key(), pk = saved.pk(), "created");
            return Ok(StarkResponse::Redirect(self.reverse_list_url(ctx)?));
        }
        debug!(model = %M::meta().key(), "add form rejected");
        render_form(&form)
    }

    pub async fn change_view(
        &self,
        ctx: &RequestContext,
        pk: i64,
    ) -> Result<StarkResponse, StarkError> {
        let Some(obj) = self.source.get(pk).await? else {
            debug!(model = %M::meta().key(), pk, "change target missing");
            return Ok(StarkResponse::Message(CHANGE_NOT_FOUND.to_string()));
        };

        let spec = self.get_model_form_class(ctx);
        if !ctx.is_post() {
            let form = StarkModelForm::for_instance(spec, obj);
            return render_form(&form);
        }

        let mut form = StarkModelForm::bound(spec, ctx.data.clone(), Some(obj));
        if form.is_valid()? {
            self.hooks.save(self, ctx, &mut form, true).await?;
            debug!(model = %M::meta().key(), pk, "updated");
            return Ok(StarkResponse::Redirect(self.reverse_list_url(ctx)?));
        }
        debug!(model = %M::meta().key(), pk, "change form rejected");
        render_form(&form)
    }

    /// GET asks for confirmation; POST deletes and returns to the list
    pub async fn delete_view(
        &self,
        ctx: &RequestContext,
        pk: i64,
    ) -> Result<StarkResponse, StarkError> {
        let cancel = self.reverse_list_url(ctx)?;
        if !ctx.is_post() {
            return Ok(StarkResponse::render(
                DELETE_TEMPLATE,
                json!({ "cancel": cancel }),
            ));
        }
        let removed = self.source.delete(&[pk]).await?;
        debug!(model = %M::meta().key(), pk, removed, "deleted");
        Ok(StarkResponse::Redirect(cancel))
    }
}

fn render_form<M: Model>(form: &StarkModelForm<M>) -> Result<StarkResponse, StarkError> {
    Ok(StarkResponse::render(
        CHANGE_TEMPLATE,
        json!({ "form": form.to_context()? }),
    ))
}

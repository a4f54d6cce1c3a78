//! Faceted filtering
//!
//! A [`FacetOption`] is declared once per handler. On every list request it is
//! evaluated into a [`FacetRow`]: the field's possible values, each rendered as
//! a link that toggles that value in the current query string.

use crate::core::{
    Choice, ConfigError, Condition, ModelMeta, RelatedItem, RequestContext, StarkError,
    model::plain_string,
};
use crate::handler::html::escape;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Label of the link that clears a facet
pub const ALL_LABEL: &str = "All";

/// Text or value extraction for one facet entry
pub type FacetItemFn = Arc<dyn Fn(&FacetItem) -> String + Send + Sync>;

/// One candidate value of a facet
#[derive(Debug, Clone, PartialEq)]
pub enum FacetItem {
    /// Entry of an enumerated field
    Choice(Choice),
    /// Row of the model a relation points at
    Related(RelatedItem),
}

/// Filterable field declared on a handler
#[derive(Clone)]
pub struct FacetOption {
    pub field: String,
    db_condition: Condition,
    text_func: Option<FacetItemFn>,
    value_func: Option<FacetItemFn>,
    pub is_multi: bool,
}

impl std::fmt::Debug for FacetOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacetOption")
            .field("field", &self.field)
            .field("db_condition", &self.db_condition)
            .field("is_multi", &self.is_multi)
            .finish()
    }
}

impl FacetOption {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            db_condition: Condition::all(),
            text_func: None,
            value_func: None,
            is_multi: false,
        }
    }

    /// Restrict which related rows are offered
    pub fn db_condition(mut self, condition: Condition) -> Self {
        self.db_condition = condition;
        self
    }

    pub fn text_func<F>(mut self, f: F) -> Self
    where
        F: Fn(&FacetItem) -> String + Send + Sync + 'static,
    {
        self.text_func = Some(Arc::new(f));
        self
    }

    pub fn value_func<F>(mut self, f: F) -> Self
    where
        F: Fn(&FacetItem) -> String + Send + Sync + 'static,
    {
        self.value_func = Some(Arc::new(f));
        self
    }

    /// Allow several values of this field to be active at once
    pub fn multi(mut self) -> Self {
        self.is_multi = true;
        self
    }

    /// Scoping condition for the related rows of this request
    pub fn get_db_condition(&self, _ctx: &RequestContext) -> Condition {
        self.db_condition.clone()
    }

    /// Enumerate the field's values and bind them to the current request
    ///
    /// Relation fields list the rows of the related model that satisfy the
    /// scoping condition; enumerated fields list their declared choices.
    pub async fn get_queryset_or_tuple(
        &self,
        meta: &ModelMeta,
        ctx: &RequestContext,
    ) -> Result<FacetRow, StarkError> {
        let field = meta.get_field(&self.field)?;
        let items = match field.kind.related_model() {
            Some(related) => {
                let source = ctx.site().sources().get(related).ok_or_else(|| {
                    ConfigError::UnknownRelation {
                        model: related.to_string(),
                    }
                })?;
                source
                    .related_items(&self.get_db_condition(ctx))
                    .await?
                    .into_iter()
                    .map(FacetItem::Related)
                    .collect()
            }
            None => field
                .kind
                .choices()
                .unwrap_or_default()
                .iter()
                .cloned()
                .map(FacetItem::Choice)
                .collect(),
        };
        Ok(FacetRow::new(
            self,
            field.verbose_name.clone(),
            !field.kind.is_relation(),
            items,
            ctx,
        ))
    }

    /// Display text: custom function, then choice label, then the row's string form
    pub fn get_text(&self, item: &FacetItem) -> String {
        if let Some(f) = &self.text_func {
            return f(item);
        }
        match item {
            FacetItem::Choice(choice) => choice.label.clone(),
            FacetItem::Related(row) => row.display.clone(),
        }
    }

    /// Query-string value: custom function, then choice value, then primary key
    pub fn get_value(&self, item: &FacetItem) -> String {
        if let Some(f) = &self.value_func {
            return f(item);
        }
        match item {
            FacetItem::Choice(choice) => plain_string(&choice.value),
            FacetItem::Related(row) => row.pk.to_string(),
        }
    }

    /// Filter contributed by this facet's active parameters
    pub fn active_condition(&self, ctx: &RequestContext) -> Option<Condition> {
        if self.is_multi {
            let values: Vec<Value> = ctx
                .query
                .get_list(&self.field)
                .into_iter()
                .filter(|v| !v.is_empty())
                .map(Value::String)
                .collect();
            if values.is_empty() {
                return None;
            }
            Some(Condition::lookup(
                &format!("{}__in", self.field),
                Value::Array(values),
            ))
        } else {
            match ctx.query.get(&self.field) {
                Some(value) if !value.is_empty() => Some(Condition::lookup(&self.field, value)),
                _ => None,
            }
        }
    }
}

/// A facet link
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FacetLink {
    pub text: String,
    /// Relative href (`?query`)
    pub href: String,
    pub active: bool,
}

impl FacetLink {
    pub fn to_html(&self) -> String {
        if self.active {
            format!(
                "<a href='{}' class='active'>{}</a>",
                escape(&self.href),
                escape(&self.text)
            )
        } else {
            format!("<a href='{}'>{}</a>", escape(&self.href), escape(&self.text))
        }
    }
}

/// A facet evaluated against one request
#[derive(Debug, Clone, Serialize)]
pub struct FacetRow {
    pub field: String,
    pub title: String,
    pub is_multi: bool,
    /// Whether the values came from an enumerated field
    pub is_choice: bool,
    /// Link clearing this facet
    pub all: FacetLink,
    pub links: Vec<FacetLink>,
}

impl FacetRow {
    pub fn new(
        option: &FacetOption,
        title: String,
        is_choice: bool,
        items: Vec<FacetItem>,
        ctx: &RequestContext,
    ) -> Self {
        let field = option.field.as_str();
        let active_values = ctx.query.get_list(field);

        let mut cleared = ctx.query.clone();
        cleared.pop(field);
        let all = FacetLink {
            text: ALL_LABEL.to_string(),
            href: format!("?{}", cleared.urlencode()),
            active: active_values.is_empty(),
        };

        let links = items
            .iter()
            .map(|item| {
                let text = option.get_text(item);
                let value = option.get_value(item);
                let mut query = ctx.query.clone();
                let active = active_values.contains(&value);
                if option.is_multi {
                    let mut values = active_values.clone();
                    if active {
                        values.retain(|v| v != &value);
                    } else {
                        values.push(value);
                    }
                    query.set_list(field, values);
                } else if active {
                    query.pop(field);
                } else {
                    query.set(field, value);
                }
                FacetLink {
                    text,
                    href: format!("?{}", query.urlencode()),
                    active,
                }
            })
            .collect();

        Self {
            field: field.to_string(),
            title,
            is_multi: option.is_multi,
            is_choice,
            all,
            links,
        }
    }

    /// The clear link followed by one link per value
    pub fn iter(&self) -> impl Iterator<Item = &FacetLink> {
        std::iter::once(&self.all).chain(self.links.iter())
    }

    /// Title block followed by the link block
    pub fn render_html(&self) -> String {
        let links: String = self.iter().map(FacetLink::to_html).collect();
        format!(
            "<div class=\"whole\">{}</div><div class=\"others\">{}</div>",
            escape(&self.title),
            links
        )
    }
}

//! List-view columns
//!
//! A column is either a model field read by name or a rendered column with its
//! own header text and cell function. Rendered cells receive the handler and
//! the request so they can build URLs that keep the caller's list state.

use crate::core::{Model, ModelMeta, RequestContext, StarkError};
use crate::handler::StarkHandler;
use crate::handler::html::escape;
use serde_json::Value;
use std::sync::Arc;

/// Header text of a rendered column
pub type HeaderFn = Arc<dyn Fn(&RequestContext) -> String + Send + Sync>;

/// Cell of a rendered column for one row
pub type CellFn<M> =
    Arc<dyn Fn(&StarkHandler<M>, &RequestContext, &M) -> Result<Value, StarkError> + Send + Sync>;

pub enum Column<M: Model> {
    /// Attribute read by name; header is the field's verbose name
    Field(String),
    /// Header and cell computed by functions
    Rendered { header: HeaderFn, cell: CellFn<M> },
}

impl<M: Model> Clone for Column<M> {
    fn clone(&self) -> Self {
        match self {
            Column::Field(name) => Column::Field(name.clone()),
            Column::Rendered { header, cell } => Column::Rendered {
                header: header.clone(),
                cell: cell.clone(),
            },
        }
    }
}

impl<M: Model> std::fmt::Debug for Column<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Column::Field(name) => f.debug_tuple("Field").field(name).finish(),
            Column::Rendered { .. } => f.write_str("Rendered"),
        }
    }
}

impl<M: Model> From<&str> for Column<M> {
    fn from(name: &str) -> Self {
        Column::Field(name.to_string())
    }
}

impl<M: Model> Column<M> {
    pub fn field(name: impl Into<String>) -> Self {
        Column::Field(name.into())
    }

    /// Rendered column with a fixed header
    pub fn rendered<F>(header: impl Into<String>, cell: F) -> Self
    where
        F: Fn(&StarkHandler<M>, &RequestContext, &M) -> Result<Value, StarkError>
            + Send
            + Sync
            + 'static,
    {
        let header = header.into();
        Column::Rendered {
            header: Arc::new(move |_| header.clone()),
            cell: Arc::new(cell),
        }
    }

    /// Header text; an unknown field name is a configuration error
    pub fn header(&self, meta: &ModelMeta, ctx: &RequestContext) -> Result<String, StarkError> {
        match self {
            Column::Field(name) => Ok(meta.get_field(name)?.verbose_name.clone()),
            Column::Rendered { header, .. } => Ok(header(ctx)),
        }
    }

    pub fn cell(
        &self,
        handler: &StarkHandler<M>,
        ctx: &RequestContext,
        row: &M,
    ) -> Result<Value, StarkError> {
        match self {
            Column::Field(name) => Ok(row.field_value(name)),
            Column::Rendered { cell, .. } => cell(handler, ctx, row),
        }
    }
}

/// Column showing the label of an enumerated field instead of its stored value
pub fn get_choice_text<M: Model>(title: impl Into<String>, field: impl Into<String>) -> Column<M> {
    let field = field.into();
    Column::rendered(title, move |_, _, row: &M| {
        let value = row.field_value(&field);
        let meta = M::meta().get_field(&field)?;
        Ok(match meta.choice_label(&value) {
            Some(label) => Value::String(label.to_string()),
            None => value,
        })
    })
}

/// Checkbox column feeding the `pk` list of bulk actions
pub fn display_check<M: Model>() -> Column<M> {
    Column::rendered("Select", |_, _, row: &M| {
        Ok(Value::String(format!(
            "<input type=\"checkbox\" name=\"pk\" value=\"{}\" />",
            row.pk()
        )))
    })
}

/// Link to the change view, keeping the current list state in `_filter`
pub fn display_edit<M: Model>() -> Column<M> {
    Column::rendered("Edit", |handler: &StarkHandler<M>, ctx, row: &M| {
        let url = handler.reverse_url(
            ctx.site(),
            &handler.get_change_url_name(),
            &[&row.pk().to_string()],
            Some(ctx),
        )?;
        Ok(Value::String(format!("<a href='{}'>Edit</a>", escape(&url))))
    })
}

/// Link to the delete view, keeping the current list state in `_filter`
pub fn display_del<M: Model>() -> Column<M> {
    Column::rendered("Delete", |handler: &StarkHandler<M>, ctx, row: &M| {
        let url = handler.reverse_url(
            ctx.site(),
            &handler.get_delete_url_name(),
            &[&row.pk().to_string()],
            Some(ctx),
        )?;
        Ok(Value::String(format!("<a href='{}'>Delete</a>", escape(&url))))
    })
}

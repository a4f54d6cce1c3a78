//! Bulk actions on the list view
//!
//! Actions are looked up by name in a per-handler registry. The action named
//! by the posted `action` field runs against the posted `pk` values; when it
//! produces a response the list view returns it unchanged, otherwise the
//! list is rendered as usual.

use crate::core::{Model, RequestContext, StarkError, StarkResponse};
use crate::handler::StarkHandler;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Behavior of a bulk action
#[async_trait]
pub trait Action<M: Model>: Send + Sync {
    /// Run against the current request; `Some` short-circuits the list view
    async fn run(
        &self,
        handler: &StarkHandler<M>,
        ctx: &RequestContext,
    ) -> Result<Option<StarkResponse>, StarkError>;
}

/// Named entry of the action registry
pub struct BulkAction<M: Model> {
    /// Identifier posted in the `action` field
    pub name: String,
    /// Human-readable label shown in the action menu
    pub text: String,
    action: Arc<dyn Action<M>>,
}

impl<M: Model> Clone for BulkAction<M> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            text: self.text.clone(),
            action: self.action.clone(),
        }
    }
}

impl<M: Model> std::fmt::Debug for BulkAction<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkAction")
            .field("name", &self.name)
            .field("text", &self.text)
            .finish()
    }
}

impl<M: Model> BulkAction<M> {
    pub fn new(
        name: impl Into<String>,
        text: impl Into<String>,
        action: impl Action<M> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            action: Arc::new(action),
        }
    }

    /// Delete every selected row
    pub fn multi_delete() -> Self {
        Self::new("action_multi_delete", "Delete selected", MultiDelete)
    }

    pub async fn run(
        &self,
        handler: &StarkHandler<M>,
        ctx: &RequestContext,
    ) -> Result<Option<StarkResponse>, StarkError> {
        self.action.run(handler, ctx).await
    }
}

/// Primary keys posted as `pk`; values that are not integers are skipped
pub fn selected_pks(ctx: &RequestContext) -> Vec<i64> {
    ctx.data
        .get_list("pk")
        .iter()
        .filter_map(|pk| pk.trim().parse().ok())
        .collect()
}

/// Deletes the selected rows and lets the list render afterwards
pub struct MultiDelete;

#[async_trait]
impl<M: Model> Action<M> for MultiDelete {
    async fn run(
        &self,
        handler: &StarkHandler<M>,
        ctx: &RequestContext,
    ) -> Result<Option<StarkResponse>, StarkError> {
        let pks = selected_pks(ctx);
        if pks.is_empty() {
            return Ok(None);
        }
        let removed = handler.source().delete(&pks).await?;
        info!(
            model = %M::meta().key(),
            requested = pks.len(),
            removed,
            "bulk delete"
        );
        Ok(None)
    }
}

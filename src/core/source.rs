//! Data source traits
//!
//! The admin never talks to a database directly. A [`DataSource`] executes a
//! [`QuerySet`] description for one model, and a [`RelatedSource`] is the
//! type-erased view of a source that facet options use to enumerate the rows a
//! relation field can point at.

use crate::core::model::Model;
use crate::core::query::{Condition, QuerySet};
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Storage operations for one model
///
/// Implementations are free to translate the query description into SQL, an
/// API call or an in-memory scan.
#[async_trait]
pub trait DataSource<M: Model>: Send + Sync {
    /// Rows matching the condition, ordered and windowed
    async fn fetch(&self, query: &QuerySet) -> Result<Vec<M>>;

    /// Number of rows matching the condition (ordering and window ignored)
    async fn count(&self, query: &QuerySet) -> Result<usize>;

    /// Get a row by primary key
    async fn get(&self, pk: i64) -> Result<Option<M>>;

    /// Insert or update; an unsaved row (pk 0) gets a new primary key
    async fn save(&self, obj: M) -> Result<M>;

    /// Delete every listed row that exists, returning how many were removed
    async fn delete(&self, pks: &[i64]) -> Result<usize>;
}

/// A row of a related model, reduced to what a facet needs
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RelatedItem {
    pub pk: i64,
    /// String form of the row
    pub display: String,
    /// Serialized row
    pub record: Value,
}

/// Type-erased enumeration of a model's rows
#[async_trait]
pub trait RelatedSource: Send + Sync {
    async fn related_items(&self, condition: &Condition) -> Result<Vec<RelatedItem>>;
}

/// Adapter exposing a typed source as a [`RelatedSource`]
pub struct RelatedAdapter<M: Model> {
    source: Arc<dyn DataSource<M>>,
}

impl<M: Model> RelatedAdapter<M> {
    pub fn new(source: Arc<dyn DataSource<M>>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<M: Model> RelatedSource for RelatedAdapter<M> {
    async fn related_items(&self, condition: &Condition) -> Result<Vec<RelatedItem>> {
        let query = QuerySet::all()
            .filter(condition.clone())
            .order_by([M::meta().pk_field.as_str()]);
        let rows = self.source.fetch(&query).await?;
        Ok(rows
            .into_iter()
            .map(|row| RelatedItem {
                pk: row.pk(),
                display: row.to_string(),
                record: row.to_record(),
            })
            .collect())
    }
}

/// Related sources keyed by model key (`app_label.model_name`)
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: HashMap<String, Arc<dyn RelatedSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a typed source under its model key
    pub fn insert<M: Model>(&mut self, source: Arc<dyn DataSource<M>>) {
        self.sources
            .insert(M::meta().key(), Arc::new(RelatedAdapter::new(source)));
    }

    pub fn get(&self, model_key: &str) -> Option<Arc<dyn RelatedSource>> {
        self.sources.get(model_key).cloned()
    }

    pub fn model_keys(&self) -> Vec<&str> {
        self.sources.keys().map(String::as_str).collect()
    }
}

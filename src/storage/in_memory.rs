//! In-memory implementation of DataSource for testing and development

use crate::core::{DataSource, Model, OrderBy, QuerySet};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// In-memory data source
///
/// Useful for testing and development. Rows are matched on their serialized
/// form. Uses RwLock for thread-safe access.
pub struct InMemorySource<M: Model> {
    rows: Arc<RwLock<BTreeMap<i64, M>>>,
}

impl<M: Model> Clone for InMemorySource<M> {
    fn clone(&self) -> Self {
        Self {
            rows: self.rows.clone(),
        }
    }
}

impl<M: Model> InMemorySource<M> {
    /// Create an empty source
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Create a source holding the given rows, assigning keys to unsaved ones
    pub fn with_rows(rows: impl IntoIterator<Item = M>) -> Result<Self> {
        let source = Self::new();
        {
            let mut map = source
                .rows
                .write()
                .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
            for mut row in rows {
                if row.pk() == 0 {
                    row.set_pk(map.keys().next_back().copied().unwrap_or(0) + 1);
                }
                map.insert(row.pk(), row);
            }
        }
        Ok(source)
    }

    /// Number of stored rows
    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn matching(&self, query: &QuerySet) -> Result<Vec<M>> {
        let rows = self
            .rows
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
        let pk_field = M::meta().pk_field.as_str();

        let mut matched: Vec<(serde_json::Value, M)> = rows
            .values()
            .map(|row| (row.to_record(), row))
            .filter(|(record, _)| query.condition.matches(record, pk_field))
            .map(|(record, row)| (record, row.clone()))
            .collect();

        if !query.ordering.is_empty() {
            matched.sort_by(|(a, _), (b, _)| OrderBy::compare(&query.ordering, a, b, pk_field));
        }

        Ok(matched.into_iter().map(|(_, row)| row).collect())
    }
}

impl<M: Model> Default for InMemorySource<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<M: Model> DataSource<M> for InMemorySource<M> {
    async fn fetch(&self, query: &QuerySet) -> Result<Vec<M>> {
        let matched = self.matching(query)?;
        Ok(match query.window {
            Some((start, end)) => matched
                .into_iter()
                .skip(start)
                .take(end.saturating_sub(start))
                .collect(),
            None => matched,
        })
    }

    async fn count(&self, query: &QuerySet) -> Result<usize> {
        Ok(self.matching(query)?.len())
    }

    async fn get(&self, pk: i64) -> Result<Option<M>> {
        let rows = self
            .rows
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(rows.get(&pk).cloned())
    }

    async fn save(&self, mut obj: M) -> Result<M> {
        let mut rows = self
            .rows
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        if obj.pk() == 0 {
            let next = rows.keys().next_back().copied().unwrap_or(0) + 1;
            obj.set_pk(next);
        }
        rows.insert(obj.pk(), obj.clone());

        Ok(obj)
    }

    async fn delete(&self, pks: &[i64]) -> Result<usize> {
        let mut rows = self
            .rows
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        Ok(pks.iter().filter(|pk| rows.remove(pk).is_some()).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Condition, FieldKind, FieldMeta, ModelMeta};
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::sync::LazyLock;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Host {
        #[serde(default)]
        id: i64,
        name: String,
    }

    impl fmt::Display for Host {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.name)
        }
    }

    impl Model for Host {
        fn meta() -> &'static ModelMeta {
            static META: LazyLock<ModelMeta> = LazyLock::new(|| {
                ModelMeta::new("app", "host").field(FieldMeta::new("name", FieldKind::Text))
            });
            &META
        }

        fn pk(&self) -> i64 {
            self.id
        }

        fn set_pk(&mut self, pk: i64) {
            self.id = pk;
        }
    }

    fn host(name: &str) -> Host {
        Host {
            id: 0,
            name: name.to_string(),
        }
    }

    fn seeded() -> InMemorySource<Host> {
        InMemorySource::with_rows(["web-1", "db-1", "web-2", "cache", "web-3"].map(host)).unwrap()
    }

    #[tokio::test]
    async fn test_save_assigns_primary_keys() {
        let source = InMemorySource::new();
        let a = source.save(host("a")).await.unwrap();
        let b = source.save(host("b")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(source.len(), 2);
    }

    #[tokio::test]
    async fn test_save_existing_updates_in_place() {
        let source = seeded();
        let mut row = source.get(2).await.unwrap().unwrap();
        row.name = "db-primary".to_string();
        source.save(row).await.unwrap();
        assert_eq!(source.len(), 5);
        assert_eq!(source.get(2).await.unwrap().unwrap().name, "db-primary");
    }

    #[tokio::test]
    async fn test_fetch_filters_orders_and_windows() {
        let source = seeded();
        let query = QuerySet::all()
            .filter(Condition::lookup("name__contains", "web"))
            .order_by(["-id"]);
        assert_eq!(source.count(&query).await.unwrap(), 3);

        let rows = source.fetch(&query.clone().slice(0, 2)).await.unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![5, 3]);

        let rows = source.fetch(&query.slice(2, 4)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 1);
    }

    #[tokio::test]
    async fn test_window_past_end_is_empty() {
        let source = seeded();
        let rows = source.fetch(&QuerySet::all().slice(50, 60)).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_delete_ignores_missing_rows() {
        let source = seeded();
        assert_eq!(source.delete(&[1, 2, 99]).await.unwrap(), 2);
        assert_eq!(source.delete(&[1]).await.unwrap(), 0);
        assert_eq!(source.len(), 3);
        assert!(source.get(1).await.unwrap().is_none());
    }
}

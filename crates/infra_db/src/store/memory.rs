//! In-memory storage engine
//!
//! Rows live in a `BTreeMap` keyed by identifier behind a `tokio` `RwLock`.
//! Clones share the same map, so a single store can back every request of a
//! development server or a test. A bounded store keeps only its newest rows
//! by creation time.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use core_kernel::{Entity, EntityState};

use crate::error::{ConcurrencyViolation, StoreError};
use crate::store::{Change, EntityStore, QuerySpec};

#[derive(Debug, Clone)]
pub struct InMemoryStore<E> {
    rows: Arc<RwLock<BTreeMap<String, E>>>,
    max_rows: Option<usize>,
}

impl<E: Entity> InMemoryStore<E> {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(BTreeMap::new())),
            max_rows: None,
        }
    }

    /// Creates a store pre-populated with `rows`
    pub fn with_rows(rows: impl IntoIterator<Item = E>) -> Self {
        let map = rows.into_iter().map(|row| (row.id(), row)).collect();
        Self {
            rows: Arc::new(RwLock::new(map)),
            max_rows: None,
        }
    }

    /// Creates an empty store holding at most `max_rows` rows (at least one)
    ///
    /// A commit that grows the store past the limit evicts the rows with the
    /// oldest `created_date`.
    pub fn bounded(max_rows: usize) -> Self {
        Self {
            rows: Arc::new(RwLock::new(BTreeMap::new())),
            max_rows: Some(max_rows.max(1)),
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// Replaces a row without any version check, simulating a write by
    /// another session
    pub async fn put(&self, row: E) {
        self.rows.write().await.insert(row.id(), row);
    }

    /// Removes a row without any version check
    pub async fn remove(&self, id: &str) -> Option<E> {
        self.rows.write().await.remove(id)
    }

    fn evict_oldest(rows: &mut BTreeMap<String, E>, max_rows: usize) -> usize {
        let excess = rows.len().saturating_sub(max_rows);
        if excess == 0 {
            return 0;
        }

        let mut by_age: Vec<(DateTime<Utc>, String)> = rows
            .values()
            .map(|row| (row.audit().created_date, row.id()))
            .collect();
        by_age.sort();
        for (_, id) in by_age.into_iter().take(excess) {
            rows.remove(&id);
        }
        excess
    }

    async fn matching(&self, spec: &QuerySpec<E>) -> Vec<E> {
        self.rows
            .read()
            .await
            .values()
            .filter(|row| spec.matches(row))
            .cloned()
            .collect()
    }
}

impl<E: Entity> Default for InMemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for InMemoryStore<E> {
    async fn load_all(&self) -> Result<Vec<E>, StoreError> {
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn load(&self, id: &str) -> Result<Option<E>, StoreError> {
        Ok(self.rows.read().await.get(id).cloned())
    }

    async fn count(&self, spec: &QuerySpec<E>) -> Result<u64, StoreError> {
        Ok(self.matching(spec).await.len() as u64)
    }

    async fn fetch_page(
        &self,
        spec: &QuerySpec<E>,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<E>, StoreError> {
        let mut rows = self.matching(spec).await;
        spec.sort_rows(&mut rows);

        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(limit as usize).collect())
    }

    #[instrument(skip_all, fields(entity = E::ENTITY_TYPE, changes = changes.len()))]
    async fn commit(&self, changes: Vec<Change<E>>) -> Result<u64, StoreError> {
        let mut rows = self.rows.write().await;
        let mut staged = rows.clone();
        let mut conflicts = Vec::new();
        let mut written = 0u64;

        for change in &changes {
            let id = change.id();
            match change.state {
                EntityState::Added => {
                    if staged.contains_key(&id) {
                        return Err(StoreError::DuplicateEntry(format!(
                            "{} with id '{}' already exists",
                            E::ENTITY_TYPE,
                            id
                        )));
                    }
                    staged.insert(id, change.entity.clone());
                }
                EntityState::Modified | EntityState::Deleted => {
                    let current = staged.get(&id).map(E::version);
                    if current != Some(change.original_version) {
                        conflicts.push(change.conflict()?);
                        continue;
                    }
                    if change.state == EntityState::Modified {
                        staged.insert(id, change.entity.clone());
                    } else {
                        staged.remove(&id);
                    }
                }
                EntityState::Unchanged => continue,
            }
            written += 1;
        }

        if !conflicts.is_empty() {
            debug!(conflicts = conflicts.len(), "Rejecting commit with stale tokens");
            return Err(StoreError::Concurrency(ConcurrencyViolation {
                entries: conflicts,
            }));
        }

        if let Some(max_rows) = self.max_rows {
            let evicted = Self::evict_oldest(&mut staged, max_rows);
            if evicted > 0 {
                debug!(evicted, max_rows, "Evicted oldest rows");
            }
        }

        *rows = staged;
        Ok(written)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_forecast::{seed_forecasts, WeatherForecast};
    use uuid::Uuid;

    fn modified(entity: WeatherForecast, original_version: Uuid) -> Change<WeatherForecast> {
        Change {
            state: EntityState::Modified,
            entity,
            original_version,
        }
    }

    #[tokio::test]
    async fn test_commit_rejects_stale_token_atomically() {
        let store = InMemoryStore::with_rows(seed_forecasts());
        let mut rows = seed_forecasts();

        let mut fresh = rows.remove(0);
        let fresh_version = fresh.audit.version;
        fresh.summary = "Scorching".to_string();
        fresh.audit.version = Uuid::new_v4();

        let mut stale = rows.remove(0);
        stale.summary = "Freezing".to_string();

        let err = store
            .commit(vec![
                modified(fresh.clone(), fresh_version),
                modified(stale.clone(), Uuid::new_v4()),
            ])
            .await
            .unwrap_err();

        match err {
            StoreError::Concurrency(violation) => {
                assert_eq!(violation.entries.len(), 1);
                assert_eq!(violation.entries[0].id, stale.id.to_string());
                assert_eq!(violation.entries[0].entity_type, "WeatherForecast");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let persisted = store.load(&fresh.id.to_string()).await.unwrap().unwrap();
        assert_eq!(persisted.summary, "Hot");
    }

    #[tokio::test]
    async fn test_commit_rejects_duplicate_insert() {
        let store = InMemoryStore::with_rows(seed_forecasts());
        let duplicate = seed_forecasts().remove(0);

        let err = store
            .commit(vec![Change {
                state: EntityState::Added,
                entity: duplicate,
                original_version: Uuid::nil(),
            }])
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::DuplicateEntry(_)));
        assert_eq!(store.len().await, 5);
    }

    #[tokio::test]
    async fn test_delete_of_missing_row_is_a_violation() {
        let store: InMemoryStore<WeatherForecast> = InMemoryStore::new();
        let row = seed_forecasts().remove(0);
        let version = row.audit.version;

        let err = store
            .commit(vec![Change {
                state: EntityState::Deleted,
                entity: row,
                original_version: version,
            }])
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Concurrency(_)));
    }

    #[tokio::test]
    async fn test_bounded_store_evicts_oldest_rows() {
        let store: InMemoryStore<WeatherForecast> = InMemoryStore::bounded(3);
        let base = Utc::now();

        let mut rows = seed_forecasts();
        for (i, row) in rows.iter_mut().enumerate() {
            row.audit.created_date = base + chrono::Duration::seconds(i as i64);
        }
        let newest: Vec<String> = rows[2..].iter().map(|r| r.id()).collect();

        for row in rows {
            store
                .commit(vec![Change {
                    state: EntityState::Added,
                    entity: row,
                    original_version: Uuid::nil(),
                }])
                .await
                .unwrap();
        }

        assert_eq!(store.len().await, 3);
        for id in newest {
            assert!(store.load(&id).await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn test_fetch_page_filters_and_slices() {
        let store = InMemoryStore::with_rows(seed_forecasts());
        let spec = QuerySpec {
            search: Some("hot".to_string()),
            sort: None,
        };

        assert_eq!(store.count(&spec).await.unwrap(), 2);
        let page = store.fetch_page(&spec, 1, 10).await.unwrap();
        assert_eq!(page.len(), 1);
    }
}

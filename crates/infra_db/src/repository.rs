//! Generic repository with a save pipeline and optimistic concurrency
//!
//! [`SqlRepository`] is one session over one entity type. Reads may attach
//! entities to its [`ChangeTracker`]; writes stage a change and immediately
//! run the save pipeline:
//!
//! ```text
//! validate_before_save -> stamp -> before_save -> commit -> after_save
//! ```
//!
//! # Concurrency conflicts
//!
//! When the store rejects a commit because a token is stale, the first
//! conflicting entry is resolved once:
//!
//! - an entry of another entity type fails with `UnsupportedConflictType`
//! - a row that no longer exists fails with `EntityDeletedConflict`
//! - otherwise the tracked original snapshot is replaced by the latest
//!   persisted values and the call fails with `ConcurrencyConflict`
//!
//! Because the snapshot was refreshed, calling
//! [`save_changes`](Repository::save_changes) again writes the caller's
//! values over the newer row.
//!
//! # Pagination
//!
//! `filter_paginated` counts and fetches in two separate store calls that are
//! not snapshotted together. A concurrent insert or delete between them can
//! make `total_count` disagree with the returned page.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use core_kernel::{Clock, Entity, EntityState, PagedResult, PaginationQuery, SystemClock};

use crate::error::{ConcurrencyViolation, RepositoryError, StoreError};
use crate::hooks::SaveHooks;
use crate::store::{Change, EntityStore, QuerySpec};
use crate::tracker::ChangeTracker;

/// An in-memory filter applied to loaded entities
pub type Predicate<'a, E> = &'a (dyn Fn(&E) -> bool + Send + Sync);

/// CRUD and query operations over one entity type
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// All entities, tracked
    async fn filter(&mut self) -> Result<Vec<E>, RepositoryError>;

    /// Entities matching `predicate`, tracked
    async fn filter_with(&mut self, predicate: Predicate<'_, E>) -> Result<Vec<E>, RepositoryError>;

    /// All entities, not tracked
    async fn filter_no_tracking(&self) -> Result<Vec<E>, RepositoryError>;

    /// Entities matching `predicate`, not tracked
    async fn filter_no_tracking_with(
        &self,
        predicate: Predicate<'_, E>,
    ) -> Result<Vec<E>, RepositoryError>;

    /// One entity by identifier, tracked
    ///
    /// # Errors
    ///
    /// `NullArgument` for a blank id, `NotFound` when no row has this id.
    async fn filter_by_id(&mut self, id: &str) -> Result<E, RepositoryError>;

    /// One page of the entities matching the query's search term
    ///
    /// # Errors
    ///
    /// `ValidationFailure` when the sort column is not sortable.
    async fn filter_paginated(&self, query: &PaginationQuery)
        -> Result<PagedResult<E>, RepositoryError>;

    /// Inserts an entity and returns it with its server fields populated
    async fn create(&mut self, entity: E) -> Result<E, RepositoryError>;

    /// Updates an entity, using its version as the expected token
    ///
    /// # Errors
    ///
    /// `NotFound` when no persisted entity matches `predicate`.
    async fn update(&mut self, predicate: Predicate<'_, E>, entity: E) -> Result<E, RepositoryError>;

    /// Deletes an entity, using its version as the expected token
    async fn delete(&mut self, entity: E) -> Result<E, RepositoryError>;

    /// Loads and deletes an entity by identifier
    async fn delete_by_id(&mut self, id: &str) -> Result<E, RepositoryError>;

    /// Runs the save pipeline over every pending change
    async fn save_changes(&mut self) -> Result<u64, RepositoryError>;

    /// Drops every pending change and returns how many were dropped
    fn discard_changes(&mut self) -> usize;
}

/// The repository implementation shared by every entity type
pub struct SqlRepository<E: Entity, S, H> {
    store: S,
    hooks: H,
    clock: Arc<dyn Clock>,
    tracker: ChangeTracker<E>,
}

impl<E, S, H> SqlRepository<E, S, H>
where
    E: Entity,
    S: EntityStore<E>,
    H: SaveHooks<E>,
{
    pub fn new(store: S, hooks: H) -> Self {
        Self {
            store,
            hooks,
            clock: Arc::new(SystemClock),
            tracker: ChangeTracker::new(),
        }
    }

    /// Uses `clock` for creation and modification timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn tracker(&self) -> &ChangeTracker<E> {
        &self.tracker
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Sets timestamps and fresh tokens on the pending changes
    fn stamp(&self, pending: &mut [Change<E>]) {
        let now = self.clock.now();

        for change in pending.iter_mut() {
            match change.state {
                EntityState::Added => change.entity.audit_mut().stamp_added(now),
                EntityState::Modified => {
                    let id = change.id();
                    let original = self
                        .tracker
                        .get(&id)
                        .and_then(|entry| entry.original.as_ref())
                        .map(|original| original.audit().clone());

                    let audit = change.entity.audit_mut();
                    let created_date = match original {
                        Some(original) => {
                            audit.created_by = original.created_by;
                            original.created_date
                        }
                        None => audit.created_date,
                    };
                    audit.stamp_modified(now, created_date);
                }
                EntityState::Deleted => {
                    debug!(entity = E::ENTITY_TYPE, id = %change.id(), "Deleting entity");
                }
                EntityState::Unchanged => {}
            }
        }
    }

    /// Validates, stamps, commits and accepts the pending changes
    async fn run_save_pipeline(&mut self) -> Result<(u64, Vec<Change<E>>), RepositoryError> {
        let mut pending = self.tracker.pending();
        if pending.is_empty() {
            return Ok((0, pending));
        }

        self.hooks.validate_before_save(&pending).await?;
        self.stamp(&mut pending);
        self.hooks.before_save(&mut pending).await?;

        match self.store.commit(pending.clone()).await {
            Ok(written) => {
                self.tracker.accept(&pending);
                self.hooks.after_save(&pending).await;
                Ok((written, pending))
            }
            Err(StoreError::Concurrency(violation)) => Err(self.resolve_conflict(violation).await),
            Err(other) => Err(other.into()),
        }
    }

    async fn resolve_conflict(&mut self, violation: ConcurrencyViolation) -> RepositoryError {
        let Some(entry) = violation.entries.first().cloned() else {
            return StoreError::Concurrency(violation).into();
        };

        if entry.entity_type != E::ENTITY_TYPE {
            warn!(
                expected = E::ENTITY_TYPE,
                actual = %entry.entity_type,
                "Concurrency conflict on an unsupported entity type"
            );
            return RepositoryError::UnsupportedConflictType(entry.entity_type);
        }

        let current = match self.store.load(&entry.id).await {
            Ok(current) => current,
            Err(e) => return e.into(),
        };

        match current {
            None => {
                warn!(entity = E::ENTITY_TYPE, id = %entry.id, "Entity was deleted by another user");
                RepositoryError::EntityDeletedConflict {
                    entity_type: entry.entity_type,
                    id: entry.id,
                }
            }
            Some(current) => {
                let snapshot = match serde_json::to_value(&current) {
                    Ok(snapshot) => snapshot,
                    Err(e) => return StoreError::from(e).into(),
                };
                warn!(entity = E::ENTITY_TYPE, id = %entry.id, "Entity was modified by another user");
                self.tracker.refresh_original(&entry.id, current);
                RepositoryError::ConcurrencyConflict {
                    entity_type: entry.entity_type,
                    id: entry.id,
                    current: snapshot,
                }
            }
        }
    }

    /// The committed values of `id`, falling back to `entity`
    fn committed(committed: Vec<Change<E>>, entity: E) -> E {
        let id = entity.id();
        committed
            .into_iter()
            .find(|change| change.id() == id)
            .map_or(entity, |change| change.entity)
    }

    async fn load_existing(&self, id: &str) -> Result<E, RepositoryError> {
        self.store
            .load(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found(E::ENTITY_TYPE, id))
    }
}

#[async_trait]
impl<E, S, H> Repository<E> for SqlRepository<E, S, H>
where
    E: Entity,
    S: EntityStore<E>,
    H: SaveHooks<E>,
{
    #[instrument(skip_all, fields(entity = E::ENTITY_TYPE))]
    async fn filter(&mut self) -> Result<Vec<E>, RepositoryError> {
        let rows = self.store.load_all().await?;
        for row in &rows {
            self.tracker.attach(row.clone());
        }
        Ok(rows)
    }

    #[instrument(skip_all, fields(entity = E::ENTITY_TYPE))]
    async fn filter_with(&mut self, predicate: Predicate<'_, E>) -> Result<Vec<E>, RepositoryError> {
        let rows: Vec<E> = self
            .store
            .load_all()
            .await?
            .into_iter()
            .filter(|row| predicate(row))
            .collect();
        for row in &rows {
            self.tracker.attach(row.clone());
        }
        Ok(rows)
    }

    async fn filter_no_tracking(&self) -> Result<Vec<E>, RepositoryError> {
        Ok(self.store.load_all().await?)
    }

    async fn filter_no_tracking_with(
        &self,
        predicate: Predicate<'_, E>,
    ) -> Result<Vec<E>, RepositoryError> {
        Ok(self
            .store
            .load_all()
            .await?
            .into_iter()
            .filter(|row| predicate(row))
            .collect())
    }

    #[instrument(skip(self), fields(entity = E::ENTITY_TYPE))]
    async fn filter_by_id(&mut self, id: &str) -> Result<E, RepositoryError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(RepositoryError::NullArgument("id"));
        }

        let entity = self.load_existing(id).await?;
        self.tracker.attach(entity.clone());
        Ok(entity)
    }

    #[instrument(skip_all, fields(entity = E::ENTITY_TYPE, page = query.page(), size = query.limit()))]
    async fn filter_paginated(
        &self,
        query: &PaginationQuery,
    ) -> Result<PagedResult<E>, RepositoryError> {
        let spec = QuerySpec::<E>::from_query(query)?;

        let total_count = self.store.count(&spec).await?;
        let items = self
            .store
            .fetch_page(&spec, query.offset(), query.limit())
            .await?;

        debug!(total_count, returned = items.len(), "Fetched page");
        Ok(PagedResult::new(items, total_count, query.page(), query.limit()))
    }

    #[instrument(skip_all, fields(entity = E::ENTITY_TYPE))]
    async fn create(&mut self, entity: E) -> Result<E, RepositoryError> {
        if !entity.has_identity() {
            return Err(RepositoryError::NullArgument("entity"));
        }

        self.tracker.add(entity.clone());
        let (_, committed) = self.run_save_pipeline().await?;
        Ok(Self::committed(committed, entity))
    }

    #[instrument(skip_all, fields(entity = E::ENTITY_TYPE, id = %entity.id()))]
    async fn update(&mut self, predicate: Predicate<'_, E>, entity: E) -> Result<E, RepositoryError> {
        if !entity.has_identity() {
            return Err(RepositoryError::NullArgument("entity"));
        }

        let exists = self
            .store
            .load_all()
            .await?
            .iter()
            .any(|row| predicate(row));
        if !exists {
            return Err(RepositoryError::not_found(E::ENTITY_TYPE, entity.id()));
        }

        let mut original = self
            .store
            .load(&entity.id())
            .await?
            .unwrap_or_else(|| entity.clone());
        original.audit_mut().version = entity.version();

        self.tracker.mark_modified(entity.clone(), original);
        let (_, committed) = self.run_save_pipeline().await?;
        Ok(Self::committed(committed, entity))
    }

    #[instrument(skip_all, fields(entity = E::ENTITY_TYPE, id = %entity.id()))]
    async fn delete(&mut self, entity: E) -> Result<E, RepositoryError> {
        if !entity.has_identity() {
            return Err(RepositoryError::NullArgument("entity"));
        }

        let mut original = self.load_existing(&entity.id()).await?;
        original.audit_mut().version = entity.version();

        self.tracker.mark_deleted(entity.clone(), original);
        self.run_save_pipeline().await?;
        Ok(entity)
    }

    async fn delete_by_id(&mut self, id: &str) -> Result<E, RepositoryError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(RepositoryError::NullArgument("id"));
        }

        let entity = self.load_existing(id).await?;
        self.delete(entity).await
    }

    #[instrument(skip_all, fields(entity = E::ENTITY_TYPE))]
    async fn save_changes(&mut self) -> Result<u64, RepositoryError> {
        let (written, _) = self.run_save_pipeline().await?;
        Ok(written)
    }

    fn discard_changes(&mut self) -> usize {
        let dropped = self.tracker.discard();
        debug!(entity = E::ENTITY_TYPE, dropped, "Discarded pending changes");
        dropped
    }
}

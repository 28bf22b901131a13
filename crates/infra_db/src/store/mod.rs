//! Storage engine contract
//!
//! An [`EntityStore`] persists one entity type. The repository never talks to
//! a database directly; it hands the store a batch of [`Change`]s and the
//! store applies them atomically, checking every Modified and Deleted change
//! against the persisted concurrency token.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use core_kernel::{Entity, EntityState, PaginationQuery, SortColumn, SortDirection};

use crate::error::{ConflictEntry, StoreError};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::{PgActivityStore, PgForecastStore};

/// A store handle shared between requests
pub type SharedStore<E> = Arc<dyn EntityStore<E>>;

/// Resolved search and ordering for a listing
///
/// Built from a [`PaginationQuery`]; the sort column has already been checked
/// against the entity's allow-list.
#[derive(Debug, Clone)]
pub struct QuerySpec<E: Entity> {
    pub search: Option<String>,
    pub sort: Option<(E::SortColumn, SortDirection)>,
}

impl<E: Entity> QuerySpec<E> {
    /// Matches every row, in identifier order
    pub fn all() -> Self {
        Self {
            search: None,
            sort: None,
        }
    }

    /// Resolves the search term and sort column of a query
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnknownSortColumn` when the column is not sortable.
    pub fn from_query(query: &PaginationQuery) -> Result<Self, core_kernel::CoreError> {
        let sort = match query.sort() {
            Some(column) => Some((column.parse::<E::SortColumn>()?, query.sort_direction)),
            None => None,
        };

        Ok(Self {
            search: query.search().map(str::to_string),
            sort,
        })
    }

    pub fn matches(&self, entity: &E) -> bool {
        self.search
            .as_deref()
            .map_or(true, |term| entity.matches_search(term))
    }

    /// Orders rows in place; ties keep their existing relative order
    pub fn sort_rows(&self, rows: &mut [E]) {
        if let Some((column, direction)) = self.sort {
            rows.sort_by(|a, b| match direction {
                SortDirection::Asc => column.compare(a, b),
                SortDirection::Desc => column.compare(b, a),
            });
        }
    }

    /// `ORDER BY` clause body, always ending with the primary key
    pub fn order_by(&self) -> String {
        match self.sort {
            Some((column, direction)) => {
                format!("{} {}, id ASC", column.column_name(), direction.as_sql())
            }
            None => "id ASC".to_string(),
        }
    }
}

/// One pending write
#[derive(Debug, Clone, PartialEq)]
pub struct Change<E> {
    /// Added, Modified or Deleted
    pub state: EntityState,
    /// The values to write
    pub entity: E,
    /// The token the caller last saw; ignored for Added changes
    pub original_version: Uuid,
}

impl<E: Entity> Change<E> {
    pub fn id(&self) -> String {
        self.entity.id()
    }

    /// Describes this change for a concurrency violation report
    pub fn conflict(&self) -> Result<ConflictEntry, StoreError> {
        Ok(ConflictEntry {
            entity_type: E::ENTITY_TYPE.to_string(),
            id: self.entity.id(),
            proposed: serde_json::to_value(&self.entity)?,
        })
    }
}

/// Persistence for one entity type
#[async_trait]
pub trait EntityStore<E: Entity>: Send + Sync {
    /// Every persisted row, in identifier order
    async fn load_all(&self) -> Result<Vec<E>, StoreError>;

    /// The current persisted values of one row
    async fn load(&self, id: &str) -> Result<Option<E>, StoreError>;

    /// Number of rows matching the search term
    async fn count(&self, spec: &QuerySpec<E>) -> Result<u64, StoreError>;

    /// One ordered slice of the rows matching the search term
    async fn fetch_page(&self, spec: &QuerySpec<E>, offset: u64, limit: u32)
        -> Result<Vec<E>, StoreError>;

    /// Applies all changes atomically and returns the number of rows written
    ///
    /// # Errors
    ///
    /// - `StoreError::Concurrency` if any Modified or Deleted change carries a
    ///   stale token or targets a missing row; nothing is written
    /// - `StoreError::DuplicateEntry` if an Added change reuses an identifier
    async fn commit(&self, changes: Vec<Change<E>>) -> Result<u64, StoreError>;

    /// Verifies the backend is reachable
    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
impl<E, S> EntityStore<E> for Arc<S>
where
    E: Entity,
    S: EntityStore<E> + ?Sized,
{
    async fn load_all(&self) -> Result<Vec<E>, StoreError> {
        (**self).load_all().await
    }

    async fn load(&self, id: &str) -> Result<Option<E>, StoreError> {
        (**self).load(id).await
    }

    async fn count(&self, spec: &QuerySpec<E>) -> Result<u64, StoreError> {
        (**self).count(spec).await
    }

    async fn fetch_page(
        &self,
        spec: &QuerySpec<E>,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<E>, StoreError> {
        (**self).fetch_page(spec, offset, limit).await
    }

    async fn commit(&self, changes: Vec<Change<E>>) -> Result<u64, StoreError> {
        (**self).commit(changes).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        (**self).ping().await
    }
}

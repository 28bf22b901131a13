//! The persisted entity contract
//!
//! Every record managed by the generic repository implements [`Entity`]. An
//! entity carries a unique string identifier and an [`AuditFields`] block with
//! the optimistic concurrency token (`version`) and creation/modification
//! timestamps.
//!
//! # Invariants
//!
//! - `version` changes on every successful write
//! - `created_date` is assigned once at insert and never mutated afterwards

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Debug;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

/// Audit and concurrency columns shared by all entities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditFields {
    /// Concurrency token, regenerated on every write
    pub version: Uuid,
    /// Who created the record
    pub created_by: String,
    /// When the record was created
    pub created_date: DateTime<Utc>,
    /// When the record was last updated
    pub modified_date: Option<DateTime<Utc>>,
}

impl AuditFields {
    /// Audit block for a record that has not been persisted yet
    ///
    /// The version is nil and the creation date is the epoch until the
    /// repository stamps the record on insert.
    pub fn new(created_by: impl Into<String>) -> Self {
        Self {
            version: Uuid::nil(),
            created_by: created_by.into(),
            created_date: DateTime::<Utc>::default(),
            modified_date: None,
        }
    }

    /// Stamps a newly added record
    pub fn stamp_added(&mut self, now: DateTime<Utc>) {
        self.created_date = now;
        self.modified_date = None;
        self.version = Uuid::new_v4();
    }

    /// Stamps a modified record, preserving the original creation date
    pub fn stamp_modified(&mut self, now: DateTime<Utc>, original_created: DateTime<Utc>) {
        self.created_date = original_created;
        self.modified_date = Some(now);
        self.version = Uuid::new_v4();
    }
}

impl Default for AuditFields {
    fn default() -> Self {
        Self::new("System")
    }
}

/// Change-tracking state of an entity within a repository session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityState {
    /// Loaded and not changed since
    Unchanged,
    /// Staged for insertion
    Added,
    /// Staged for update
    Modified,
    /// Staged for removal
    Deleted,
}

impl EntityState {
    /// Returns true if the entry must be written on the next save
    pub fn is_pending(&self) -> bool {
        !matches!(self, EntityState::Unchanged)
    }
}

impl std::fmt::Display for EntityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityState::Unchanged => "unchanged",
            EntityState::Added => "added",
            EntityState::Modified => "modified",
            EntityState::Deleted => "deleted",
        };
        f.write_str(name)
    }
}

/// A record type managed by the generic repository
pub trait Entity:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Allow-list of columns this entity can be sorted by
    type SortColumn: SortColumn<Self>;

    /// Stable type name, used in logs and to match concurrency conflicts
    const ENTITY_TYPE: &'static str;

    /// The persisted primary key
    fn id(&self) -> String;

    /// Returns false when the caller supplied an empty entity
    fn has_identity(&self) -> bool {
        !self.id().trim().is_empty()
    }

    fn audit(&self) -> &AuditFields;

    fn audit_mut(&mut self) -> &mut AuditFields;

    /// The current concurrency token
    fn version(&self) -> Uuid {
        self.audit().version
    }

    /// Free-text search, matched case-insensitively against the entity's text columns
    fn matches_search(&self, term: &str) -> bool;
}

/// A sortable column of an entity
///
/// Implementations are closed enums so that a caller-supplied column name can
/// never reach the store unless it was explicitly allowed.
pub trait SortColumn<E>: Copy + Debug + PartialEq + FromStr<Err = CoreError> + Send + Sync + 'static {
    /// SQL expression backing this sort key, usually the bare column
    fn column_name(&self) -> &'static str;

    /// In-memory ordering equivalent to `ORDER BY column_name ASC`
    fn compare(&self, a: &E, b: &E) -> Ordering;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_audit_fields_are_unstamped() {
        let audit = AuditFields::new("tester");
        assert!(audit.version.is_nil());
        assert_eq!(audit.created_by, "tester");
        assert!(audit.modified_date.is_none());
    }

    #[test]
    fn test_stamp_modified_keeps_created_date() {
        let created = Utc.with_ymd_and_hms(2025, 1, 4, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 2, 1, 12, 0, 0).unwrap();

        let mut audit = AuditFields::new("tester");
        audit.stamp_added(created);
        let first_version = audit.version;

        audit.created_date = now;
        audit.stamp_modified(now, created);

        assert_eq!(audit.created_date, created);
        assert_eq!(audit.modified_date, Some(now));
        assert_ne!(audit.version, first_version);
    }

    #[test]
    fn test_entity_state_pending() {
        assert!(!EntityState::Unchanged.is_pending());
        assert!(EntityState::Added.is_pending());
        assert!(EntityState::Modified.is_pending());
        assert!(EntityState::Deleted.is_pending());
    }
}

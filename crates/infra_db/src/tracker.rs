//! Change tracking for one repository session
//!
//! Every tracked entity has a state, its current values and an original
//! snapshot. The snapshot supplies the concurrency token checked at commit
//! and the creation date restored when a modified entity is stamped.

use std::collections::BTreeMap;

use uuid::Uuid;

use core_kernel::{Entity, EntityState};

use crate::store::Change;

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedEntry<E> {
    pub state: EntityState,
    pub current: E,
    /// Last known persisted values; `None` for entities staged for insert
    pub original: Option<E>,
}

impl<E: Entity> TrackedEntry<E> {
    /// The token the store must still hold for this entry to be written
    pub fn original_version(&self) -> Uuid {
        self.original
            .as_ref()
            .map_or_else(Uuid::nil, |original| original.version())
    }
}

/// Tracked entities keyed by identifier
#[derive(Debug, Clone)]
pub struct ChangeTracker<E> {
    entries: BTreeMap<String, TrackedEntry<E>>,
}

impl<E: Entity> ChangeTracker<E> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Tracks a freshly loaded entity as Unchanged
    ///
    /// An entry with pending changes is left untouched so a later query
    /// cannot silently discard them.
    pub fn attach(&mut self, entity: E) {
        let id = entity.id();
        if self
            .entries
            .get(&id)
            .is_some_and(|entry| entry.state.is_pending())
        {
            return;
        }
        self.entries.insert(
            id,
            TrackedEntry {
                state: EntityState::Unchanged,
                original: Some(entity.clone()),
                current: entity,
            },
        );
    }

    /// Stages an entity for insertion
    pub fn add(&mut self, entity: E) {
        self.entries.insert(
            entity.id(),
            TrackedEntry {
                state: EntityState::Added,
                current: entity,
                original: None,
            },
        );
    }

    /// Stages an entity for update against the given original snapshot
    pub fn mark_modified(&mut self, entity: E, original: E) {
        self.entries.insert(
            entity.id(),
            TrackedEntry {
                state: EntityState::Modified,
                current: entity,
                original: Some(original),
            },
        );
    }

    /// Stages an entity for removal against the given original snapshot
    pub fn mark_deleted(&mut self, entity: E, original: E) {
        self.entries.insert(
            entity.id(),
            TrackedEntry {
                state: EntityState::Deleted,
                current: entity,
                original: Some(original),
            },
        );
    }

    pub fn get(&self, id: &str) -> Option<&TrackedEntry<E>> {
        self.entries.get(id)
    }

    pub fn state(&self, id: &str) -> Option<EntityState> {
        self.entries.get(id).map(|entry| entry.state)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_changes(&self) -> bool {
        self.entries.values().any(|entry| entry.state.is_pending())
    }

    /// The pending entries as changes, in identifier order
    pub fn pending(&self) -> Vec<Change<E>> {
        self.entries
            .values()
            .filter(|entry| entry.state.is_pending())
            .map(|entry| Change {
                state: entry.state,
                entity: entry.current.clone(),
                original_version: entry.original_version(),
            })
            .collect()
    }

    /// Replaces the original snapshot with freshly loaded values
    ///
    /// Returns false if the entity is not tracked.
    pub fn refresh_original(&mut self, id: &str, persisted: E) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.original = Some(persisted);
                true
            }
            None => false,
        }
    }

    /// Records a successful commit of `committed`
    ///
    /// Added and Modified entries become Unchanged with the written values as
    /// their new snapshot; Deleted entries stop being tracked.
    pub fn accept(&mut self, committed: &[Change<E>]) {
        for change in committed {
            let id = change.id();
            if change.state == EntityState::Deleted {
                self.entries.remove(&id);
                continue;
            }
            self.entries.insert(
                id,
                TrackedEntry {
                    state: EntityState::Unchanged,
                    current: change.entity.clone(),
                    original: Some(change.entity.clone()),
                },
            );
        }
    }

    /// Drops every pending entry; Unchanged entries stay tracked
    pub fn discard(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.state.is_pending());
        before - self.entries.len()
    }
}

impl<E: Entity> Default for ChangeTracker<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_forecast::{seed_forecasts, WeatherForecast};

    fn forecast() -> WeatherForecast {
        seed_forecasts().remove(0)
    }

    #[test]
    fn test_attach_does_not_clobber_pending_changes() {
        let mut tracker = ChangeTracker::new();
        let mut edited = forecast();
        edited.summary = "Mild".to_string();
        tracker.mark_modified(edited, forecast());

        tracker.attach(forecast());

        let entry = tracker.get(&forecast().id.to_string()).unwrap();
        assert_eq!(entry.state, EntityState::Modified);
        assert_eq!(entry.current.summary, "Mild");
    }

    #[test]
    fn test_pending_carries_original_version() {
        let mut tracker = ChangeTracker::new();
        let mut original = forecast();
        original.audit.version = Uuid::new_v4();
        tracker.mark_modified(forecast(), original.clone());

        let pending = tracker.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].original_version, original.audit.version);
    }

    #[test]
    fn test_accept_detaches_deleted_entries() {
        let mut tracker = ChangeTracker::new();
        tracker.mark_deleted(forecast(), forecast());
        let pending = tracker.pending();

        tracker.accept(&pending);

        assert!(tracker.is_empty());
        assert!(!tracker.has_changes());
    }

    #[test]
    fn test_discard_keeps_unchanged_entries() {
        let mut tracker = ChangeTracker::new();
        let mut rows = seed_forecasts();
        tracker.attach(rows.remove(0));
        tracker.add(rows.remove(0));

        assert_eq!(tracker.discard(), 1);
        assert_eq!(tracker.len(), 1);
        assert!(!tracker.has_changes());
    }
}

//! Save pipeline hooks
//!
//! A repository calls its hooks around every commit, in this order:
//!
//! 1. `validate_before_save`: may veto the save
//! 2. timestamps and tokens are stamped by the repository
//! 3. `before_save`: may adjust the pending values
//! 4. the store commits
//! 5. `after_save`
//!
//! Every method has a default that only logs, so an entity type overrides
//! just the steps it cares about.

use async_trait::async_trait;
use tracing::{debug, info};

use core_kernel::Entity;

use crate::error::RepositoryError;
use crate::store::Change;

#[async_trait]
pub trait SaveHooks<E: Entity>: Send + Sync {
    /// Inspects the unstamped pending changes; an error aborts the save
    async fn validate_before_save(&self, pending: &[Change<E>]) -> Result<(), RepositoryError> {
        debug!(
            entity = E::ENTITY_TYPE,
            pending = pending.len(),
            "Validating pending changes"
        );
        Ok(())
    }

    /// Runs after stamping and right before the commit
    async fn before_save(&self, pending: &mut [Change<E>]) -> Result<(), RepositoryError> {
        for change in pending.iter() {
            info!(
                entity = E::ENTITY_TYPE,
                id = %change.id(),
                state = %change.state,
                "Saving entity"
            );
        }
        Ok(())
    }

    /// Runs once the store accepted the commit
    async fn after_save(&self, committed: &[Change<E>]) {
        for change in committed {
            info!(
                entity = E::ENTITY_TYPE,
                id = %change.id(),
                state = %change.state,
                "Saved entity"
            );
        }
    }
}

/// Hooks that only log
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHooks;

impl<E: Entity> SaveHooks<E> for LoggingHooks {}

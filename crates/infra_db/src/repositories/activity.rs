//! Activity log repository

use async_trait::async_trait;

use domain_forecast::UserActivityLog;

use crate::error::RepositoryError;
use crate::hooks::SaveHooks;
use crate::repository::SqlRepository;
use crate::store::{Change, SharedStore};

pub type ActivityRepository<S = SharedStore<UserActivityLog>> =
    SqlRepository<UserActivityLog, S, ActivityHooks>;

/// Clips oversized request data to the column widths before writing
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityHooks;

#[async_trait]
impl SaveHooks<UserActivityLog> for ActivityHooks {
    async fn before_save(
        &self,
        pending: &mut [Change<UserActivityLog>],
    ) -> Result<(), RepositoryError> {
        for change in pending.iter_mut() {
            change.entity.truncate_to_limits();
        }
        Ok(())
    }
}

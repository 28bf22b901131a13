//! PostgreSQL storage engines
//!
//! Each store issues runtime-checked SQLx queries against its own table. A
//! commit runs in a single transaction; updates and deletes carry the
//! caller's original token in their `WHERE` clause, so zero affected rows
//! means the row was changed or removed by someone else.

use sqlx::{Postgres, QueryBuilder, Transaction};
use tracing::debug;

use crate::error::{ConcurrencyViolation, ConflictEntry, StoreError};

mod activity;
mod forecast;

pub use activity::PgActivityStore;
pub use forecast::PgForecastStore;

/// `%term%` with LIKE wildcards in the term escaped
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Appends `WHERE (a ILIKE $n OR b ILIKE $n ...)` for a search term
fn push_search(builder: &mut QueryBuilder<'_, Postgres>, columns: &[&str], search: Option<&str>) {
    let Some(term) = search else {
        return;
    };

    let pattern = like_pattern(term);
    builder.push(" WHERE (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            builder.push(" OR ");
        }
        builder.push(*column).push(" ILIKE ").push_bind(pattern.clone());
    }
    builder.push(")");
}

/// Appends the ordering and the skip/take window
fn push_page(builder: &mut QueryBuilder<'_, Postgres>, order_by: &str, offset: u64, limit: u32) {
    builder
        .push(" ORDER BY ")
        .push(order_by)
        .push(" LIMIT ")
        .push_bind(i64::from(limit))
        .push(" OFFSET ")
        .push_bind(i64::try_from(offset).unwrap_or(i64::MAX));
}

/// Commits the transaction, or rolls it back if any change was stale
async fn finish_commit(
    tx: Transaction<'_, Postgres>,
    conflicts: Vec<ConflictEntry>,
    written: u64,
) -> Result<u64, StoreError> {
    if !conflicts.is_empty() {
        debug!(conflicts = conflicts.len(), "Rolling back commit with stale tokens");
        tx.rollback().await?;
        return Err(StoreError::Concurrency(ConcurrencyViolation {
            entries: conflicts,
        }));
    }

    tx.commit().await?;
    Ok(written)
}

fn count_from(total: i64) -> u64 {
    u64::try_from(total).unwrap_or(0)
}

// Transaction management
use crate::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

/// Begins transactions for multi-statement writes
pub struct TransactionManager<'p> {
    pool: &'p PgPool,
    label: &'static str,
}

impl<'p> TransactionManager<'p> {
    #[must_use]
    pub fn new(pool: &'p PgPool) -> Self {
        Self { pool, label: "unnamed" }
    }

    /// Name used in debug logs for this unit of work
    #[must_use]
    pub fn labelled(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    /// Begin a new transaction
    ///
    /// # Errors
    /// Returns `QueryFailed` when no connection can be acquired.
    pub async fn begin(&self) -> DatabaseResult<Transaction<'static, Postgres>> {
        debug!(unit = self.label, "Beginning transaction");

        self.pool
            .begin()
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("Failed to begin transaction: {e}")))
    }
}

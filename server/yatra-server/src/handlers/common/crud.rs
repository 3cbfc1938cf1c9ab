//! Shared lookups for tables keyed by `id`
//!
//! Handlers implement `ResourceTable` for their row type to get
//! fetch-by-id and deactivate without repeating the SQL.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::error::ApiError;

/// Today's date in UTC, used for document dates and date checks
#[must_use]
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

#[async_trait]
pub trait ResourceTable: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static {
    /// The database table name
    const TABLE: &'static str;

    /// Resource name used in not-found messages
    const RESOURCE: &'static str;

    /// Load a row by primary key
    ///
    /// # Errors
    /// `NotFound` when no row has this id.
    async fn fetch_by_id<'e, E>(executor: E, id: Uuid) -> Result<Self, ApiError>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!("SELECT * FROM {} WHERE id = $1", Self::TABLE);
        sqlx::query_as::<_, Self>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| ApiError::not_found(Self::RESOURCE))
    }

    /// Lock a row for the rest of the transaction and load it
    ///
    /// # Errors
    /// `NotFound` when no row has this id.
    async fn fetch_for_update<'e, E>(executor: E, id: Uuid) -> Result<Self, ApiError>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!("SELECT * FROM {} WHERE id = $1 FOR UPDATE", Self::TABLE);
        sqlx::query_as::<_, Self>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| ApiError::not_found(Self::RESOURCE))
    }

    /// Mark a row inactive and stamp the closing audit fields
    ///
    /// # Errors
    /// `NotFound` when no active row has this id.
    async fn deactivate<'e, E>(executor: E, id: Uuid, closed_by: Uuid) -> Result<(), ApiError>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            "UPDATE {} SET is_active = FALSE, closed_by = $2, closed_on = NOW(), \
             modified_by = $2, modified_on = NOW() WHERE id = $1 AND is_active",
            Self::TABLE
        );
        let rows = sqlx::query(&sql)
            .bind(id)
            .bind(closed_by)
            .execute(executor)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(ApiError::not_found(Self::RESOURCE));
        }
        Ok(())
    }
}

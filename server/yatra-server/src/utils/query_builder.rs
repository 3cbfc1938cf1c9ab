//! Query builder utilities for consistent SQL query construction
//!
//! List endpoints build the same filter chain twice: once over a
//! `SELECT COUNT(*)` base for the total, once over the row select with
//! ordering and pagination applied.

use crate::types::pagination::PaginationParams;
use sqlx::postgres::PgArguments;
use sqlx::query::{QueryAs, QueryScalar};
use sqlx::{Postgres, QueryBuilder};

/// Paginated query builder for consistent query construction
///
/// Base queries must end with a `WHERE` clause; every filter appends
/// `AND <column> <op> $n`.
///
/// ```rust,ignore
/// let mut query = PaginatedQuery::new("SELECT * FROM bookings WHERE 1=1");
/// query
///     .filter_eq("status", params.status.map(|s| s.as_str()))
///     .filter_gte("travel_date", params.from)
///     .order_by("entered_on", "DESC")
///     .paginate(&params.pagination());
///
/// let rows: Vec<BookingRow> = query.build_query_as().fetch_all(&pool).await?;
/// ```
pub struct PaginatedQuery<'a> {
    query: QueryBuilder<'a, Postgres>,
    page: u32,
    page_size: u32,
}

impl<'a> PaginatedQuery<'a> {
    /// Create a new paginated query builder
    #[must_use]
    pub fn new(base_query: &'static str) -> Self {
        Self {
            query: QueryBuilder::new(base_query),
            page: 1,
            page_size: crate::types::pagination::DEFAULT_PAGE_SIZE,
        }
    }

    /// Add a required base filter
    pub fn add_base_filter<T>(&mut self, column: &str, value: T) -> &mut Self
    where
        T: for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Send + Sync + 'static,
    {
        self.query.push(format!(" AND {column} = "));
        self.query.push_bind(value);
        self
    }

    /// Add an equality filter (only if value is Some)
    pub fn filter_eq<T>(&mut self, column: &str, value: Option<T>) -> &mut Self
    where
        T: for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Send + Sync + 'static,
    {
        if let Some(val) = value {
            self.add_base_filter(column, val);
        }
        self
    }

    /// Add a lower bound filter (only if value is Some)
    pub fn filter_gte<T>(&mut self, column: &str, value: Option<T>) -> &mut Self
    where
        T: for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Send + Sync + 'static,
    {
        if let Some(val) = value {
            self.query.push(format!(" AND {column} >= "));
            self.query.push_bind(val);
        }
        self
    }

    /// Add an upper bound filter (only if value is Some)
    pub fn filter_lte<T>(&mut self, column: &str, value: Option<T>) -> &mut Self
    where
        T: for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Send + Sync + 'static,
    {
        if let Some(val) = value {
            self.query.push(format!(" AND {column} <= "));
            self.query.push_bind(val);
        }
        self
    }

    /// Case-insensitive substring match (only if value is non-blank)
    pub fn filter_ilike(&mut self, column: &str, value: Option<&str>) -> &mut Self {
        if let Some(term) = value.map(str::trim).filter(|t| !t.is_empty()) {
            self.query.push(format!(" AND {column} ILIKE "));
            self.query.push_bind(format!("%{term}%"));
        }
        self
    }

    /// Filter for records that have not been closed
    pub fn filter_open(&mut self) -> &mut Self {
        self.query.push(" AND closed_on IS NULL");
        self
    }

    /// Add ORDER BY clause
    pub fn order_by(&mut self, column: &str, direction: &str) -> &mut Self {
        self.query.push(format!(" ORDER BY {column} {direction}"));
        self
    }

    /// Add ORDER BY entered_on DESC (common pattern)
    pub fn order_by_entered_desc(&mut self) -> &mut Self {
        self.order_by("entered_on", "DESC")
    }

    /// Apply pagination
    pub fn paginate(&mut self, params: &PaginationParams) -> &mut Self {
        self.page = params.page();
        self.page_size = params.page_size();
        self.query.push(" LIMIT ");
        self.query.push_bind(i64::from(self.page_size));
        self.query.push(" OFFSET ");
        self.query
            .push_bind(i64::try_from(params.offset()).unwrap_or(i64::MAX));
        self
    }

    /// Build the final query as a typed query for fetching specific types
    pub fn build_query_as<T>(&mut self) -> QueryAs<'_, Postgres, T, PgArguments>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow>,
    {
        self.query.build_query_as()
    }

    /// Build a single-value query, e.g. over a `COUNT(*)` base
    pub fn build_query_scalar<T>(&mut self) -> QueryScalar<'_, Postgres, T, PgArguments>
    where
        T: sqlx::Type<Postgres> + for<'r> sqlx::Decode<'r, Postgres>,
        (T,): for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow>,
    {
        self.query.build_query_scalar()
    }

    /// Current SQL text, for logging and tests
    #[must_use]
    pub fn sql(&self) -> &str {
        self.query.sql()
    }

    /// Get the underlying query builder for advanced use cases
    pub fn query_builder(&mut self) -> &mut QueryBuilder<'a, Postgres> {
        &mut self.query
    }

    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    const BASE: &str = "SELECT * FROM bookings WHERE 1=1";

    #[test]
    fn test_filter_eq_with_some_and_none() {
        let mut query = PaginatedQuery::new(BASE);
        query
            .filter_eq("status", Some("DRAFT"))
            .filter_eq("customer_id", None::<Uuid>);
        assert_eq!(query.sql(), "SELECT * FROM bookings WHERE 1=1 AND status = $1");
    }

    #[test]
    fn test_range_filters_number_their_binds() {
        let from = NaiveDate::from_ymd_opt(2026, 4, 1);
        let to = NaiveDate::from_ymd_opt(2026, 4, 30);
        let mut query = PaginatedQuery::new(BASE);
        query
            .filter_gte("travel_date", from)
            .filter_lte("travel_date", to);
        assert_eq!(
            query.sql(),
            "SELECT * FROM bookings WHERE 1=1 AND travel_date >= $1 AND travel_date <= $2"
        );
    }

    #[test]
    fn test_filter_ilike_ignores_blank_terms() {
        let mut query = PaginatedQuery::new(BASE);
        query.filter_ilike("origin", Some("  "));
        assert_eq!(query.sql(), BASE);
        query.filter_ilike("origin", Some("Delhi"));
        assert!(query.sql().ends_with("AND origin ILIKE $1"));
    }

    #[test]
    fn test_filter_open() {
        let mut query = PaginatedQuery::new(BASE);
        query.filter_open();
        assert!(query.sql().ends_with("AND closed_on IS NULL"));
    }

    #[test]
    fn test_order_and_paginate() {
        let mut query = PaginatedQuery::new(BASE);
        query
            .filter_eq("status", Some("CONFIRMED"))
            .order_by_entered_desc()
            .paginate(&PaginationParams {
                page: Some(3),
                page_size: Some(50),
            });
        assert_eq!(query.page(), 3);
        assert_eq!(query.page_size(), 50);
        assert!(query
            .sql()
            .ends_with("ORDER BY entered_on DESC LIMIT $2 OFFSET $3"));
    }

    #[test]
    fn test_paginate_clamps() {
        let mut query = PaginatedQuery::new(BASE);
        query.paginate(&PaginationParams {
            page: Some(0),
            page_size: Some(500),
        });
        assert_eq!(query.page(), 1);
        assert_eq!(query.page_size(), 100);
    }
}

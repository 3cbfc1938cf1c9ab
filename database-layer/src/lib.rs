//! Persistence layer for the YatraSathi engine
//!
//! - Connection pooling and health checks over PostgreSQL (`sqlx`)
//! - Embedded schema migrations (`migrations/`)
//! - Transaction helper for multi-statement writes
//! - Atomic per-series, per-financial-year document numbering
//! - Constraint violation classification (foreign key / unique)
//!
//! # Example
//!
//! ```rust,no_run
//! use database_layer::{DatabasePool, DocumentSeries, PoolSettings, TransactionManager};
//!
//! # async fn run() -> Result<(), database_layer::DatabaseError> {
//! let db = DatabasePool::new("postgres://localhost/yatrasathi", &PoolSettings::default()).await?;
//! db.run_migrations().await?;
//!
//! let mut tx = TransactionManager::new(db.pool()).labelled("booking").begin().await?;
//! let today = chrono::Utc::now().date_naive();
//! let number = database_layer::next_document_number(&mut tx, DocumentSeries::Booking, today).await?;
//! tx.commit().await?;
//! println!("allocated {number}");
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod models;
pub mod sequence;
pub mod transaction;

pub use connection::*;
pub use error::*;
pub use models::*;
pub use sequence::*;
pub use transaction::*;

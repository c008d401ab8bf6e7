//! Relational store abstraction.
//!
//! The handler set talks to persistence through the [`Database`] trait, which
//! exposes the three statement shapes the API needs:
//!
//! ```text
//! execute    INSERT / DELETE          -> affected row count
//! fetch_one  SELECT COUNT(*) ...      -> Option<Row>
//! fetch_all  SELECT * ... ORDER BY    -> Vec<Row>
//! ```
//!
//! Rows are column-name keyed JSON maps so they can be returned to callers
//! verbatim or decoded into typed records with serde.
//!
//! Constraint violations come back as [`StoreError::Conflict`], classified by
//! the backend from the engine's error code.
//!
//! [`StoreError::Conflict`]: crate::error::StoreError::Conflict

mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;

pub use sqlite::{SqliteDatabase, MEMORY_PATH};

/// A single result row, keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// A bound statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Text(String),
    Integer(i64),
    Null,
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Text(value)
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Param::Integer(value)
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Param::Null)
    }
}

/// Parameterized statement execution against a relational store.
///
/// Implementations must report uniqueness violations as
/// [`StoreError::Conflict`] so callers can give them business meaning.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run a statement for its effect and return the number of affected rows.
    async fn execute(&self, sql: &str, params: &[Param]) -> Result<usize, StoreError>;

    /// Run a query and return its first row, if any.
    async fn fetch_one(&self, sql: &str, params: &[Param]) -> Result<Option<Row>, StoreError>;

    /// Run a query and return every row in result order.
    async fn fetch_all(&self, sql: &str, params: &[Param]) -> Result<Vec<Row>, StoreError>;
}

#[async_trait]
impl<D: Database + ?Sized> Database for Arc<D> {
    async fn execute(&self, sql: &str, params: &[Param]) -> Result<usize, StoreError> {
        (**self).execute(sql, params).await
    }

    async fn fetch_one(&self, sql: &str, params: &[Param]) -> Result<Option<Row>, StoreError> {
        (**self).fetch_one(sql, params).await
    }

    async fn fetch_all(&self, sql: &str, params: &[Param]) -> Result<Vec<Row>, StoreError> {
        (**self).fetch_all(sql, params).await
    }
}

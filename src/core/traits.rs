//! Storage contract required by the aggregate store and the reverse index
//!
//! This module defines the trait a key-value backend implements so the core
//! can be handed any engine at construction. The in-memory engine in
//! [`crate::storage`] is the reference implementation.

use crate::types::{Row, TableError};
use async_trait::async_trait;
use serde_json::Value;

/// Result of a conditional list append
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionalAppend {
    /// The value was appended; carries the row after the write
    Appended(Row),

    /// The value was already in the list, nothing was written
    AlreadyPresent,

    /// No row exists at the given key, nothing was written
    MissingRow,
}

/// Trait for a key-value table addressed by (partition key, sort key)
///
/// Every method is one round trip to the engine. Implementations must make
/// `conditional_append` atomic: the membership check and the append are one
/// operation, so concurrent callers appending the same value leave exactly
/// one occurrence.
#[async_trait]
pub trait TableClient: Send + Sync {
    /// Unconditional upsert of a whole row
    async fn put(&self, row: Row) -> Result<(), TableError>;

    /// All rows sharing a partition key, in sort key order
    async fn get_by_partition(&self, partition_key: &str) -> Result<Vec<Row>, TableError>;

    /// Remove one row; removing an absent row is not an error
    async fn delete(&self, partition_key: &str, sort_key: &str) -> Result<(), TableError>;

    /// Set one attribute on a row, creating the row if it is absent
    async fn update_attribute(
        &self,
        partition_key: &str,
        sort_key: &str,
        attribute_key: &str,
        value: Value,
    ) -> Result<(), TableError>;

    /// Append `value` to a list attribute unless it is already present
    async fn conditional_append(
        &self,
        partition_key: &str,
        sort_key: &str,
        list_attribute_key: &str,
        value: &str,
    ) -> Result<ConditionalAppend, TableError>;

    /// Rows whose `index_attribute_key` equals `value`
    ///
    /// Served from a secondary index that may lag behind the table.
    async fn query_by_secondary_index(
        &self,
        index_attribute_key: &str,
        value: &str,
    ) -> Result<Vec<Row>, TableError>;
}

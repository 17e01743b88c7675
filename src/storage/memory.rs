//! Thread-safe in-memory table
//!
//! This module provides the `MemoryTable` struct, a key-value table addressed
//! by (partition key, sort key) that implements [`TableClient`].
//!
//! # Design
//!
//! Partitions live in a `DashMap`, each holding an ordered map of sort key to
//! attribute bag. DashMap shards its locks, so writes to different branches
//! proceed in parallel while writes to one branch are serialized. The shard
//! lock is held across the membership check and the push in
//! `conditional_append`, which is what makes the append atomic.
//!
//! Secondary indexes are declared at construction. Index queries scan the
//! partitions and match on the indexed attribute.

use crate::core::traits::{ConditionalAppend, TableClient};
use crate::types::row::{BILLING_ACCOUNT_NUMBER, BRANCH_ID};
use crate::types::{Attributes, Row, TableError};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::BTreeMap;

/// In-memory key-value table with secondary indexes
#[derive(Debug)]
pub struct MemoryTable {
    /// Rows grouped by partition key, then ordered by sort key
    partitions: DashMap<String, BTreeMap<String, Attributes>>,

    /// Attributes that can be queried through `query_by_secondary_index`
    indexed_attributes: Vec<String>,
}

impl MemoryTable {
    /// Create an empty table indexed on `billingAccountNumber`
    pub fn new() -> Self {
        Self::with_indexes([BILLING_ACCOUNT_NUMBER])
    }

    /// Create an empty table with the given secondary indexes
    pub fn with_indexes<I, S>(indexed_attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            partitions: DashMap::new(),
            indexed_attributes: indexed_attributes.into_iter().map(Into::into).collect(),
        }
    }

    /// Load rows into the table, replacing rows with the same key
    pub fn insert_rows(&self, rows: impl IntoIterator<Item = Row>) {
        for row in rows {
            self.upsert(row);
        }
    }

    /// Every row of the table, ordered by partition key then sort key
    pub fn scan(&self) -> Vec<Row> {
        let mut rows: Vec<Row> = self
            .partitions
            .iter()
            .flat_map(|entry| {
                let branch_id = entry.key().clone();
                entry
                    .value()
                    .iter()
                    .map(|(sort_key, attributes)| Row {
                        branch_id: branch_id.clone(),
                        billing_account_number: sort_key.clone(),
                        attributes: attributes.clone(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        rows.sort_by(|a, b| {
            (&a.branch_id, &a.billing_account_number)
                .cmp(&(&b.branch_id, &b.billing_account_number))
        });
        rows
    }

    /// Attributes declared as secondary indexes
    pub fn indexed_attributes(&self) -> &[String] {
        &self.indexed_attributes
    }

    fn upsert(&self, row: Row) {
        self.partitions
            .entry(row.branch_id)
            .or_insert_with(BTreeMap::new)
            .insert(row.billing_account_number, row.attributes);
    }

    fn matches(
        attribute: &str,
        value: &str,
        branch_id: &str,
        sort_key: &str,
        attributes: &Attributes,
    ) -> bool {
        match attribute {
            BRANCH_ID => branch_id == value,
            BILLING_ACCOUNT_NUMBER => sort_key == value,
            other => attributes.get(other).and_then(Value::as_str) == Some(value),
        }
    }
}

impl Default for MemoryTable {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TableClient for MemoryTable {
    async fn put(&self, row: Row) -> Result<(), TableError> {
        self.upsert(row);
        Ok(())
    }

    async fn get_by_partition(&self, partition_key: &str) -> Result<Vec<Row>, TableError> {
        let rows = self
            .partitions
            .get(partition_key)
            .map(|partition| {
                partition
                    .iter()
                    .map(|(sort_key, attributes)| Row {
                        branch_id: partition_key.to_string(),
                        billing_account_number: sort_key.clone(),
                        attributes: attributes.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(rows)
    }

    async fn delete(&self, partition_key: &str, sort_key: &str) -> Result<(), TableError> {
        // The guard must be released before remove_if takes the shard lock again
        let now_empty = match self.partitions.get_mut(partition_key) {
            Some(mut partition) => {
                partition.remove(sort_key);
                partition.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.partitions
                .remove_if(partition_key, |_, partition| partition.is_empty());
        }
        Ok(())
    }

    async fn update_attribute(
        &self,
        partition_key: &str,
        sort_key: &str,
        attribute_key: &str,
        value: Value,
    ) -> Result<(), TableError> {
        self.partitions
            .entry(partition_key.to_string())
            .or_insert_with(BTreeMap::new)
            .entry(sort_key.to_string())
            .or_default()
            .insert(attribute_key.to_string(), value);
        Ok(())
    }

    async fn conditional_append(
        &self,
        partition_key: &str,
        sort_key: &str,
        list_attribute_key: &str,
        value: &str,
    ) -> Result<ConditionalAppend, TableError> {
        let Some(mut partition) = self.partitions.get_mut(partition_key) else {
            return Ok(ConditionalAppend::MissingRow);
        };
        let Some(attributes) = partition.get_mut(sort_key) else {
            return Ok(ConditionalAppend::MissingRow);
        };

        let list = attributes
            .entry(list_attribute_key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        let Value::Array(items) = list else {
            return Err(TableError::codec(format!(
                "attribute '{}' of {}/{} is not a list",
                list_attribute_key, partition_key, sort_key
            )));
        };
        if items.iter().any(|item| item.as_str() == Some(value)) {
            return Ok(ConditionalAppend::AlreadyPresent);
        }
        items.push(Value::String(value.to_string()));

        Ok(ConditionalAppend::Appended(Row {
            branch_id: partition_key.to_string(),
            billing_account_number: sort_key.to_string(),
            attributes: attributes.clone(),
        }))
    }

    async fn query_by_secondary_index(
        &self,
        index_attribute_key: &str,
        value: &str,
    ) -> Result<Vec<Row>, TableError> {
        if !self
            .indexed_attributes
            .iter()
            .any(|attribute| attribute == index_attribute_key)
        {
            return Err(TableError::MissingIndex {
                attribute: index_attribute_key.to_string(),
            });
        }

        let mut rows: Vec<Row> = Vec::new();
        for entry in self.partitions.iter() {
            for (sort_key, attributes) in entry.value() {
                if Self::matches(index_attribute_key, value, entry.key(), sort_key, attributes) {
                    rows.push(Row {
                        branch_id: entry.key().clone(),
                        billing_account_number: sort_key.clone(),
                        attributes: attributes.clone(),
                    });
                }
            }
        }
        rows.sort_by(|a, b| a.branch_id.cmp(&b.branch_id));
        Ok(rows)
    }
}

//! Aggregate store for branch accounts
//!
//! This module provides the `AccountStore` struct, which owns the mapping
//! between the logical Account and its rows in the branch table.
//!
//! The AccountStore is responsible for:
//! - Writing the master row of a new branch
//! - Assembling an Account from its partition on read
//! - Adding billing rows under an existing branch
//! - Setting master row attributes
//! - Appending service account numbers through one conditional write
//! - Deleting a branch, billing rows first and master row last
//!
//! Every call goes to the injected table; nothing is cached.

use crate::core::merge::merge_partition;
use crate::core::traits::{ConditionalAppend, TableClient};
use crate::types::row::{
    is_billing_number, BILLING_ACCOUNT_NUMBER, BRANCH_ID, MASTER_SORT_KEY, SERVICE_ACCOUNT_NUMBER,
};
use crate::types::{Account, AppendOutcome, DeletedAccount, Row, StoreError};
use serde_json::Value;
use std::sync::Arc;

/// Reads and writes branch account aggregates
///
/// Holds a shared handle to the table so it can sit next to a
/// [`crate::core::ReverseIndex`] built on the same client.
#[derive(Debug)]
pub struct AccountStore<C> {
    table: Arc<C>,
}

impl<C> Clone for AccountStore<C> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
        }
    }
}

impl<C: TableClient> AccountStore<C> {
    /// Create a new AccountStore over the given table
    pub fn new(table: Arc<C>) -> Self {
        Self { table }
    }

    /// Write the master row of a branch
    ///
    /// Overwrites any existing master row for the branch without checking for
    /// it first. Billing rows are left alone.
    ///
    /// # Returns
    ///
    /// * `Ok(Row)` - The master row as written
    /// * `Err(StoreError::InvalidKey)` - If `branch_id` is empty
    pub async fn create_account(&self, branch_id: &str, crm_id: &str) -> Result<Row, StoreError> {
        validate_branch_id(branch_id)?;

        let row = Row::master(branch_id, crm_id);
        self.table.put(row.clone()).await?;
        Ok(row)
    }

    /// Assemble the Account stored under a branch
    ///
    /// # Returns
    ///
    /// * `Ok(Account)` - The merged master row and billing rows
    /// * `Err(StoreError::BranchNotFound)` - If the partition is empty
    /// * `Err(StoreError::CorruptAggregate)` - If billing rows exist without a master row
    pub async fn get_account(&self, branch_id: &str) -> Result<Account, StoreError> {
        let rows = self.table.get_by_partition(branch_id).await?;
        merge_partition(branch_id, rows)
    }

    /// Add a billing row under an existing branch
    ///
    /// The existence probe and the write are separate round trips. A branch
    /// deleted in between leaves an orphaned billing row behind, which later
    /// reads report as `CorruptAggregate`.
    ///
    /// An existing billing row with the same number is replaced, including its
    /// service account list.
    ///
    /// # Returns
    ///
    /// * `Ok(Account)` - The Account re-read after the write
    /// * `Err(StoreError::BranchNotFound)` - If the branch does not exist (nothing written)
    /// * `Err(StoreError::InvalidKey)` - If the billing number is empty or `"null"`
    pub async fn add_billing_account(
        &self,
        branch_id: &str,
        billing_account_number: &str,
    ) -> Result<Account, StoreError> {
        self.probe_master(branch_id).await?;
        if !is_billing_number(billing_account_number) {
            return Err(StoreError::invalid_key(
                BILLING_ACCOUNT_NUMBER,
                billing_account_number,
            ));
        }

        self.table
            .put(Row::billing(branch_id, billing_account_number))
            .await?;
        self.get_account(branch_id).await
    }

    /// Set one attribute on the master row of an existing branch
    ///
    /// # Returns
    ///
    /// * `Ok(Account)` - The Account re-read after the update
    /// * `Err(StoreError::BranchNotFound)` - If the branch does not exist (nothing written)
    /// * `Err(StoreError::InvalidAttribute)` - If `key` is empty or a key attribute
    pub async fn set_master_attribute(
        &self,
        branch_id: &str,
        key: &str,
        value: Value,
    ) -> Result<Account, StoreError> {
        self.probe_master(branch_id).await?;
        if key.is_empty() || key == BRANCH_ID || key == BILLING_ACCOUNT_NUMBER {
            return Err(StoreError::invalid_attribute(key));
        }

        self.table
            .update_attribute(branch_id, MASTER_SORT_KEY, key, value)
            .await?;
        self.get_account(branch_id).await
    }

    /// Append a service account number to a billing row
    ///
    /// Issued as a single conditional write, so concurrent appends of the same
    /// value leave exactly one occurrence.
    ///
    /// # Returns
    ///
    /// * `Ok(AppendOutcome::Appended(row))` - The billing row after the append
    /// * `Ok(AppendOutcome::Conflict)` - The value was already present; nothing written
    /// * `Err(StoreError::BillingNotFound)` - If the billing row does not exist
    pub async fn append_service_account(
        &self,
        branch_id: &str,
        billing_account_number: &str,
        service_account_number: &str,
    ) -> Result<AppendOutcome, StoreError> {
        // The sentinel names the master row, never a billing row
        if !is_billing_number(billing_account_number) {
            return Err(StoreError::billing_not_found(
                branch_id,
                billing_account_number,
            ));
        }

        let outcome = self
            .table
            .conditional_append(
                branch_id,
                billing_account_number,
                SERVICE_ACCOUNT_NUMBER,
                service_account_number,
            )
            .await?;
        match outcome {
            ConditionalAppend::Appended(row) => Ok(AppendOutcome::Appended(row)),
            ConditionalAppend::AlreadyPresent => Ok(AppendOutcome::Conflict),
            ConditionalAppend::MissingRow => Err(StoreError::billing_not_found(
                branch_id,
                billing_account_number,
            )),
        }
    }

    /// Delete a branch and every billing row under it
    ///
    /// Billing rows go first and the master row last, so an interrupted delete
    /// can only leave billing rows without a master, never the reverse. A
    /// partition that already lost its master row is cleaned up the same way.
    ///
    /// # Returns
    ///
    /// * `Ok(DeletedAccount)` - The branch and the billing numbers removed
    /// * `Err(StoreError::BranchNotFound)` - If the partition is empty
    pub async fn delete_account(&self, branch_id: &str) -> Result<DeletedAccount, StoreError> {
        let rows = self.table.get_by_partition(branch_id).await?;
        if rows.is_empty() {
            return Err(StoreError::branch_not_found(branch_id));
        }

        let (master, billing): (Vec<Row>, Vec<Row>) = rows.into_iter().partition(Row::is_master);
        let mut removed = Vec::with_capacity(billing.len());
        for row in billing {
            self.table
                .delete(branch_id, &row.billing_account_number)
                .await?;
            removed.push(row.billing_account_number);
        }
        if !master.is_empty() {
            self.table.delete(branch_id, MASTER_SORT_KEY).await?;
        }

        Ok(DeletedAccount {
            branch_id: branch_id.to_string(),
            billing_accounts_removed: removed,
        })
    }

    /// Check that a branch has its master row
    async fn probe_master(&self, branch_id: &str) -> Result<(), StoreError> {
        let rows = self.table.get_by_partition(branch_id).await?;
        if rows.is_empty() {
            return Err(StoreError::branch_not_found(branch_id));
        }
        if !rows.iter().any(Row::is_master) {
            return Err(StoreError::corrupt_aggregate(branch_id));
        }
        Ok(())
    }
}

fn validate_branch_id(branch_id: &str) -> Result<(), StoreError> {
    if branch_id.is_empty() {
        return Err(StoreError::invalid_key(BRANCH_ID, branch_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryTable;
    use crate::types::TableError;
    use async_trait::async_trait;
    use rstest::rstest;
    use serde_json::json;
    use std::sync::Mutex;

    fn new_store() -> (AccountStore<MemoryTable>, Arc<MemoryTable>) {
        let table = Arc::new(MemoryTable::new());
        (AccountStore::new(Arc::clone(&table)), table)
    }

    /// Memory table that records deletes and can fail the nth one
    struct RecordingTable {
        inner: MemoryTable,
        deletes: Mutex<Vec<String>>,
        fail_delete: Option<usize>,
    }

    impl RecordingTable {
        fn new(fail_delete: Option<usize>) -> Self {
            Self {
                inner: MemoryTable::new(),
                deletes: Mutex::new(Vec::new()),
                fail_delete,
            }
        }

        fn deletes(&self) -> Vec<String> {
            self.deletes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TableClient for RecordingTable {
        async fn put(&self, row: Row) -> Result<(), TableError> {
            self.inner.put(row).await
        }

        async fn get_by_partition(&self, partition_key: &str) -> Result<Vec<Row>, TableError> {
            self.inner.get_by_partition(partition_key).await
        }

        async fn delete(&self, partition_key: &str, sort_key: &str) -> Result<(), TableError> {
            let attempt = {
                let mut deletes = self.deletes.lock().unwrap();
                deletes.push(sort_key.to_string());
                deletes.len()
            };
            if self.fail_delete == Some(attempt) {
                return Err(TableError::io("connection reset"));
            }
            self.inner.delete(partition_key, sort_key).await
        }

        async fn update_attribute(
            &self,
            partition_key: &str,
            sort_key: &str,
            attribute_key: &str,
            value: Value,
        ) -> Result<(), TableError> {
            self.inner
                .update_attribute(partition_key, sort_key, attribute_key, value)
                .await
        }

        async fn conditional_append(
            &self,
            partition_key: &str,
            sort_key: &str,
            list_attribute_key: &str,
            value: &str,
        ) -> Result<ConditionalAppend, TableError> {
            self.inner
                .conditional_append(partition_key, sort_key, list_attribute_key, value)
                .await
        }

        async fn query_by_secondary_index(
            &self,
            index_attribute_key: &str,
            value: &str,
        ) -> Result<Vec<Row>, TableError> {
            self.inner
                .query_by_secondary_index(index_attribute_key, value)
                .await
        }
    }

    fn seeded_recording(
        fail_delete: Option<usize>,
    ) -> (AccountStore<RecordingTable>, Arc<RecordingTable>) {
        let table = Arc::new(RecordingTable::new(fail_delete));
        table.inner.insert_rows(vec![
            Row::master("B1", "C1"),
            Row::billing("B1", "100"),
            Row::billing("B1", "200"),
        ]);
        (AccountStore::new(Arc::clone(&table)), table)
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let (store, _) = new_store();

        let row = store.create_account("B1", "C1").await.unwrap();
        let account = store.get_account("B1").await.unwrap();

        assert_eq!(row, Row::master("B1", "C1"));
        assert_eq!(account.crm_id(), Some("C1"));
        assert!(account.billing_accounts.is_empty());
    }

    #[tokio::test]
    async fn test_create_overwrites_master_and_keeps_billing_rows() {
        let (store, _) = new_store();
        store.create_account("B1", "C1").await.unwrap();
        store
            .set_master_attribute("B1", "region", json!("EU"))
            .await
            .unwrap();
        store.add_billing_account("B1", "100").await.unwrap();

        store.create_account("B1", "C2").await.unwrap();
        let account = store.get_account("B1").await.unwrap();

        assert_eq!(account.crm_id(), Some("C2"));
        assert!(!account.master_attributes.contains_key("region"));
        assert!(account.billing_accounts.contains_key("100"));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_branch_id() {
        let (store, table) = new_store();

        let result = store.create_account("", "C1").await;

        assert_eq!(result, Err(StoreError::invalid_key("branchId", "")));
        assert!(table.scan().is_empty());
    }

    #[tokio::test]
    async fn test_get_unknown_branch_is_not_found() {
        let (store, _) = new_store();
        assert_eq!(
            store.get_account("B1").await,
            Err(StoreError::branch_not_found("B1"))
        );
    }

    #[tokio::test]
    async fn test_add_billing_account_returns_merged_account() {
        let (store, _) = new_store();
        store.create_account("B1", "C1").await.unwrap();

        let account = store.add_billing_account("B1", "100").await.unwrap();

        assert_eq!(account.billing_accounts.len(), 1);
        assert!(account.billing_accounts["100"]
            .service_account_number
            .is_empty());
    }

    #[tokio::test]
    async fn test_add_billing_account_overwrites_existing_row() {
        let (store, _) = new_store();
        store.create_account("B1", "C1").await.unwrap();
        store.add_billing_account("B1", "100").await.unwrap();
        store
            .append_service_account("B1", "100", "S1")
            .await
            .unwrap();

        let account = store.add_billing_account("B1", "100").await.unwrap();

        assert!(account.billing_accounts["100"]
            .service_account_number
            .is_empty());
    }

    #[rstest]
    #[case::sentinel("null")]
    #[case::empty("")]
    #[tokio::test]
    async fn test_add_billing_account_rejects_reserved_numbers(#[case] number: &str) {
        let (store, _) = new_store();
        store.create_account("B1", "C1").await.unwrap();

        let result = store.add_billing_account("B1", number).await;

        assert_eq!(
            result,
            Err(StoreError::invalid_key("billingAccountNumber", number))
        );
        assert_eq!(store.get_account("B1").await.unwrap().crm_id(), Some("C1"));
    }

    #[tokio::test]
    async fn test_set_master_attribute_only_touches_master() {
        let (store, table) = new_store();
        store.create_account("B1", "C1").await.unwrap();
        store.add_billing_account("B1", "100").await.unwrap();

        let account = store
            .set_master_attribute("B1", "address", json!({"city": "Oslo"}))
            .await
            .unwrap();

        assert_eq!(account.master_attributes["address"], json!({"city": "Oslo"}));
        let billing = table.get_by_partition("B1").await.unwrap();
        assert!(!billing[0].attributes.contains_key("address"));
    }

    #[rstest]
    #[case::branch_id("branchId")]
    #[case::billing_number("billingAccountNumber")]
    #[case::empty("")]
    #[tokio::test]
    async fn test_set_master_attribute_rejects_reserved_keys(#[case] key: &str) {
        let (store, _) = new_store();
        store.create_account("B1", "C1").await.unwrap();

        let result = store.set_master_attribute("B1", key, json!("x")).await;

        assert_eq!(result, Err(StoreError::invalid_attribute(key)));
    }

    #[tokio::test]
    async fn test_operations_on_unknown_branch_are_not_found() {
        let (store, table) = new_store();

        let add = store.add_billing_account("B1", "100").await;
        let set = store.set_master_attribute("B1", "k", json!("v")).await;
        let append = store.append_service_account("B1", "100", "S1").await;

        assert_eq!(add, Err(StoreError::branch_not_found("B1")));
        assert_eq!(set, Err(StoreError::branch_not_found("B1")));
        assert_eq!(append, Err(StoreError::billing_not_found("B1", "100")));
        assert!(table.scan().is_empty());
    }

    #[tokio::test]
    async fn test_append_is_idempotent() {
        let (store, _) = new_store();
        store.create_account("B1", "C1").await.unwrap();
        store.add_billing_account("B1", "100").await.unwrap();

        let first = store
            .append_service_account("B1", "100", "S1")
            .await
            .unwrap();
        let second = store
            .append_service_account("B1", "100", "S1")
            .await
            .unwrap();

        match first {
            AppendOutcome::Appended(row) => {
                assert_eq!(row.billing_account_number, "100");
                assert_eq!(row.service_account_numbers(), vec!["S1"]);
            }
            AppendOutcome::Conflict => panic!("First append should not conflict"),
        }
        assert_eq!(second, AppendOutcome::Conflict);
        let account = store.get_account("B1").await.unwrap();
        assert_eq!(account.billing_accounts["100"].service_account_number, vec!["S1"]);
    }

    #[tokio::test]
    async fn test_append_keeps_insertion_order() {
        let (store, _) = new_store();
        store.create_account("B1", "C1").await.unwrap();
        store.add_billing_account("B1", "100").await.unwrap();

        for value in ["S3", "S1", "S2"] {
            store
                .append_service_account("B1", "100", value)
                .await
                .unwrap();
        }

        let account = store.get_account("B1").await.unwrap();
        assert_eq!(
            account.billing_accounts["100"].service_account_number,
            vec!["S3", "S1", "S2"]
        );
    }

    #[tokio::test]
    async fn test_append_to_master_sentinel_is_not_found() {
        let (store, table) = new_store();
        store.create_account("B1", "C1").await.unwrap();

        let result = store.append_service_account("B1", "null", "S1").await;

        assert_eq!(result, Err(StoreError::billing_not_found("B1", "null")));
        let rows = table.get_by_partition("B1").await.unwrap();
        assert_eq!(rows, vec![Row::master("B1", "C1")]);
    }

    #[tokio::test]
    async fn test_delete_account_cascades() {
        let (store, table) = new_store();
        store.create_account("B1", "C1").await.unwrap();
        store.add_billing_account("B1", "100").await.unwrap();
        store.add_billing_account("B1", "200").await.unwrap();
        store.create_account("B2", "C2").await.unwrap();

        let deleted = store.delete_account("B1").await.unwrap();

        assert_eq!(deleted.billing_accounts_removed, vec!["100", "200"]);
        assert_eq!(
            store.get_account("B1").await,
            Err(StoreError::branch_not_found("B1"))
        );
        assert_eq!(table.scan(), vec![Row::master("B2", "C2")]);
    }

    #[tokio::test]
    async fn test_delete_unknown_account_is_not_found() {
        let (store, _) = new_store();
        assert_eq!(
            store.delete_account("B1").await,
            Err(StoreError::branch_not_found("B1"))
        );
    }

    #[tokio::test]
    async fn test_orphaned_billing_rows_are_corrupt_and_deletable() {
        let (store, table) = new_store();
        table.put(Row::billing("B1", "100")).await.unwrap();

        assert_eq!(
            store.get_account("B1").await,
            Err(StoreError::corrupt_aggregate("B1"))
        );
        assert_eq!(
            store.add_billing_account("B1", "200").await,
            Err(StoreError::corrupt_aggregate("B1"))
        );

        let deleted = store.delete_account("B1").await.unwrap();

        assert_eq!(deleted.billing_accounts_removed, vec!["100"]);
        assert!(table.scan().is_empty());
    }

    #[tokio::test]
    async fn test_delete_account_removes_master_last() {
        let (store, table) = seeded_recording(None);

        store.delete_account("B1").await.unwrap();

        assert_eq!(table.deletes(), vec!["100", "200", "null"]);
        assert!(table.inner.scan().is_empty());
    }

    #[tokio::test]
    async fn test_delete_account_propagates_storage_failure() {
        let (store, table) = seeded_recording(Some(2));

        let result = store.delete_account("B1").await;

        assert_eq!(
            result,
            Err(StoreError::Storage(TableError::io("connection reset")))
        );
        assert_eq!(table.deletes(), vec!["100", "200"]);
        assert_eq!(
            table.inner.scan(),
            vec![Row::billing("B1", "200"), Row::master("B1", "C1")]
        );
        assert_eq!(
            store.get_account("B1").await.unwrap().crm_id(),
            Some("C1")
        );
    }
}

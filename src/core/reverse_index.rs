//! Reverse lookup from billing account number to owning branch
//!
//! Resolution goes through the table's secondary index on
//! `billingAccountNumber`. The index is maintained by the storage engine and
//! may lag behind the table, so a number written moments ago can resolve to
//! nothing. Callers should treat that `NotFound` as possibly transient.

use crate::core::traits::TableClient;
use crate::types::row::{is_billing_number, BILLING_ACCOUNT_NUMBER};
use crate::types::{BranchId, DeletedBilling, StoreError};
use std::sync::Arc;

/// Resolves billing numbers to branches and deletes single billing rows
#[derive(Debug)]
pub struct ReverseIndex<C> {
    table: Arc<C>,
}

impl<C> Clone for ReverseIndex<C> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
        }
    }
}

impl<C: TableClient> ReverseIndex<C> {
    /// Create a new ReverseIndex over the given table
    pub fn new(table: Arc<C>) -> Self {
        Self { table }
    }

    /// Find the branch owning a billing account number
    ///
    /// `"null"` marks the master row and is never a billing number, so it
    /// resolves to `NotFound` without a query. So does the empty string.
    ///
    /// # Returns
    ///
    /// * `Ok(BranchId)` - The branch of the first index match
    /// * `Err(StoreError::BillingNumberUnresolved)` - If the index holds no match
    pub async fn resolve_branch(&self, billing_account_number: &str) -> Result<BranchId, StoreError> {
        if !is_billing_number(billing_account_number) {
            return Err(StoreError::billing_number_unresolved(billing_account_number));
        }

        let rows = self
            .table
            .query_by_secondary_index(BILLING_ACCOUNT_NUMBER, billing_account_number)
            .await?;
        rows.into_iter()
            .next()
            .map(|row| row.branch_id)
            .ok_or_else(|| StoreError::billing_number_unresolved(billing_account_number))
    }

    /// Delete the billing row with the given number
    ///
    /// Only that row is removed; the master row and sibling billing rows stay.
    pub async fn delete_billing(
        &self,
        billing_account_number: &str,
    ) -> Result<DeletedBilling, StoreError> {
        let branch_id = self.resolve_branch(billing_account_number).await?;
        self.table.delete(&branch_id, billing_account_number).await?;

        Ok(DeletedBilling {
            branch_id,
            billing_account_number: billing_account_number.to_string(),
        })
    }
}

//! Assembly of an Account from the rows of one partition
//!
//! The merge is pure: it reads the rows it is given and never touches
//! storage, so reads never repair or rewrite anything.

use crate::types::{Account, BillingAccount, Row, StoreError};

/// Partition a branch's rows into an Account
///
/// # Arguments
///
/// * `branch_id` - The partition the rows were read from
/// * `rows` - Every row of that partition, in any order
///
/// # Returns
///
/// * `Ok(Account)` - The master row's attributes plus one billing entry per other row
/// * `Err(StoreError::BranchNotFound)` - If `rows` is empty
/// * `Err(StoreError::CorruptAggregate)` - If rows exist but none is the master row
pub fn merge_partition(branch_id: &str, rows: Vec<Row>) -> Result<Account, StoreError> {
    if rows.is_empty() {
        return Err(StoreError::branch_not_found(branch_id));
    }

    let mut master = None;
    let mut billing = Vec::with_capacity(rows.len());
    for row in rows {
        if row.is_master() {
            master = Some(row);
        } else {
            billing.push(row);
        }
    }

    let master = master.ok_or_else(|| StoreError::corrupt_aggregate(branch_id))?;
    let mut account = Account::new(branch_id, master.attributes);
    for row in billing {
        let service_account_number = row.service_account_numbers();
        account.billing_accounts.insert(
            row.billing_account_number,
            BillingAccount {
                service_account_number,
            },
        );
    }

    Ok(account)
}

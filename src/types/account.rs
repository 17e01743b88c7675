//! Account-related types for branch accounts
//!
//! This module defines the logical Account aggregate assembled from the rows
//! of one partition, together with the outcome types returned by write
//! operations.

use super::row::{Attributes, BillingAccountNumber, BranchId, Row};
use serde::Serialize;
use std::collections::BTreeMap;

/// Billing sub-account as seen in an assembled Account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BillingAccount {
    /// Service account numbers in append order, without duplicates
    #[serde(rename = "serviceAccountNumber")]
    pub service_account_number: Vec<String>,
}

/// Branch account aggregate
///
/// Represents one branch: the attributes of its master row and every billing
/// sub-account stored under the same partition key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// The branch ID shared by every row of the account
    pub branch_id: BranchId,

    /// Attributes of the master row (`crmId` and anything set later)
    ///
    /// The key attributes are not repeated here.
    pub master_attributes: Attributes,

    /// Billing sub-accounts keyed by billing account number
    pub billing_accounts: BTreeMap<BillingAccountNumber, BillingAccount>,
}

impl Account {
    /// Create an account with the given master attributes and no billing accounts
    pub fn new(branch_id: impl Into<String>, master_attributes: Attributes) -> Self {
        Account {
            branch_id: branch_id.into(),
            master_attributes,
            billing_accounts: BTreeMap::new(),
        }
    }

    /// The CRM identifier recorded on the master row, if it is a string
    pub fn crm_id(&self) -> Option<&str> {
        self.master_attributes
            .get(super::row::CRM_ID)
            .and_then(|v| v.as_str())
    }
}

/// Result of a service account append
///
/// `Conflict` is a normal outcome: the value was already present and
/// nothing was written.
#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    /// The value was appended; carries the billing row after the append
    Appended(Row),

    /// The value was already present in the row's list
    Conflict,
}

/// Confirmation of a cascading account delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedAccount {
    pub branch_id: BranchId,
    /// Billing numbers whose rows were removed, in sort key order
    pub billing_accounts_removed: Vec<BillingAccountNumber>,
}

/// Confirmation of a single billing row delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedBilling {
    pub branch_id: BranchId,
    pub billing_account_number: BillingAccountNumber,
}

//! Physical row types for the branch table
//!
//! Every logical account is stored as a sparse set of rows sharing one
//! partition key. This module defines the row shape and the reserved
//! attribute names the rest of the crate relies on.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Partition key attribute name
pub const BRANCH_ID: &str = "branchId";

/// Sort key attribute name, also the attribute the reverse index is built on
pub const BILLING_ACCOUNT_NUMBER: &str = "billingAccountNumber";

/// List attribute carried by billing rows
pub const SERVICE_ACCOUNT_NUMBER: &str = "serviceAccountNumber";

/// CRM identifier written on the master row at creation
pub const CRM_ID: &str = "crmId";

/// Sort key of the master row
///
/// This is a literal string, not an absent value. It is excluded from the
/// billing number namespace.
pub const MASTER_SORT_KEY: &str = "null";

/// Open attribute bag of a row, excluding its two key attributes
pub type Attributes = BTreeMap<String, Value>;

/// Branch identifier (partition key)
pub type BranchId = String;

/// Billing account number (sort key of a billing row)
pub type BillingAccountNumber = String;

/// A single row of the branch table
///
/// Serializes flat, the way the row is stored: both key attributes next to
/// the open attribute bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Partition key, shared by every row of one account
    #[serde(rename = "branchId")]
    pub branch_id: BranchId,

    /// Sort key: `"null"` for the master row, the billing number otherwise
    #[serde(rename = "billingAccountNumber")]
    pub billing_account_number: BillingAccountNumber,

    /// Everything else stored on the row
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl Row {
    /// Create a row with an empty attribute bag
    pub fn new(branch_id: impl Into<String>, billing_account_number: impl Into<String>) -> Self {
        Row {
            branch_id: branch_id.into(),
            billing_account_number: billing_account_number.into(),
            attributes: Attributes::new(),
        }
    }

    /// Build the master row written by account creation
    pub fn master(branch_id: impl Into<String>, crm_id: impl Into<String>) -> Self {
        let mut row = Row::new(branch_id, MASTER_SORT_KEY);
        row.attributes
            .insert(CRM_ID.to_string(), Value::String(crm_id.into()));
        row
    }

    /// Build a billing row with an empty service account list
    pub fn billing(branch_id: impl Into<String>, billing_account_number: impl Into<String>) -> Self {
        let mut row = Row::new(branch_id, billing_account_number);
        row.attributes
            .insert(SERVICE_ACCOUNT_NUMBER.to_string(), Value::Array(Vec::new()));
        row
    }

    /// Whether this row is the master row of its partition
    pub fn is_master(&self) -> bool {
        self.billing_account_number == MASTER_SORT_KEY
    }

    /// Service account numbers held by this row
    ///
    /// An absent attribute reads as an empty list. Entries that are not
    /// strings are skipped.
    pub fn service_account_numbers(&self) -> Vec<String> {
        match self.attributes.get(SERVICE_ACCOUNT_NUMBER) {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Whether a caller-supplied billing number can name a billing row
///
/// Rejects the empty string and the master sentinel.
pub fn is_billing_number(value: &str) -> bool {
    !value.is_empty() && value != MASTER_SORT_KEY
}

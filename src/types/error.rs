//! Error types for branch accounts
//!
//! This module defines the errors the aggregate store and the reverse index
//! can signal, and the errors a storage backend can raise.
//!
//! # Error Categories
//!
//! - **Lookup**: the referenced branch, billing row or billing number is absent
//! - **Consistency**: billing rows exist without a master row
//! - **Validation**: reserved or empty keys and attribute names
//! - **Storage**: backend failures, propagated to the caller unrecovered
//!
//! An idempotent append that finds its value already present is not an
//! error; see [`crate::types::AppendOutcome`].

use thiserror::Error;

/// Errors raised by a storage backend
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    /// I/O error while reading or writing table data
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
    },

    /// Table data could not be encoded or decoded
    #[error("Codec error: {message}")]
    Codec {
        /// Description of the encoding failure
        message: String,
    },

    /// A secondary index query named an attribute with no index
    #[error("No secondary index on attribute '{attribute}'")]
    MissingIndex {
        /// The attribute that was queried
        attribute: String,
    },

    /// Persisted data belongs to another table
    #[error("Snapshot holds table '{found}', expected '{expected}'")]
    TableMismatch {
        /// Table name from configuration
        expected: String,
        /// Table name found in the snapshot
        found: String,
    },
}

/// Main error type for store and reverse index operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// No rows exist for the branch
    #[error("Branch {branch_id} not found")]
    BranchNotFound {
        /// The branch that was looked up
        branch_id: String,
    },

    /// The billing row to update does not exist
    #[error("Billing account {billing_account_number} not found under branch {branch_id}")]
    BillingNotFound {
        /// Branch the row was looked up under
        branch_id: String,
        /// The billing number that was looked up
        billing_account_number: String,
    },

    /// The reverse index holds no row for the billing number
    #[error("No branch owns billing account {billing_account_number}")]
    BillingNumberUnresolved {
        /// The billing number that was resolved
        billing_account_number: String,
    },

    /// Billing rows were found with no master row
    ///
    /// Cannot occur when every write goes through the store in order; can be
    /// left behind by an interrupted delete or the add-billing race.
    #[error("Branch {branch_id} has billing rows but no master row")]
    CorruptAggregate {
        /// The branch whose partition is inconsistent
        branch_id: String,
    },

    /// A key value is empty or reserved
    #[error("Invalid {field} '{value}'")]
    InvalidKey {
        /// Which key was rejected
        field: &'static str,
        /// The rejected value
        value: String,
    },

    /// A master attribute name is empty or reserved
    #[error("Attribute '{key}' cannot be set on the master row")]
    InvalidAttribute {
        /// The rejected attribute name
        key: String,
    },

    /// The storage backend failed
    #[error("Storage error: {0}")]
    Storage(#[from] TableError),
}

impl TableError {
    /// Create an Io error
    pub fn io(message: impl Into<String>) -> Self {
        TableError::Io {
            message: message.into(),
        }
    }

    /// Create a Codec error
    pub fn codec(message: impl Into<String>) -> Self {
        TableError::Codec {
            message: message.into(),
        }
    }
}

// Conversion from io::Error to TableError
impl From<std::io::Error> for TableError {
    fn from(error: std::io::Error) -> Self {
        TableError::io(error.to_string())
    }
}

// Conversion from serde_json::Error to TableError
impl From<serde_json::Error> for TableError {
    fn from(error: serde_json::Error) -> Self {
        TableError::codec(error.to_string())
    }
}

// Helper functions for creating common errors

impl StoreError {
    /// Create a BranchNotFound error
    pub fn branch_not_found(branch_id: &str) -> Self {
        StoreError::BranchNotFound {
            branch_id: branch_id.to_string(),
        }
    }

    /// Create a BillingNotFound error
    pub fn billing_not_found(branch_id: &str, billing_account_number: &str) -> Self {
        StoreError::BillingNotFound {
            branch_id: branch_id.to_string(),
            billing_account_number: billing_account_number.to_string(),
        }
    }

    /// Create a BillingNumberUnresolved error
    pub fn billing_number_unresolved(billing_account_number: &str) -> Self {
        StoreError::BillingNumberUnresolved {
            billing_account_number: billing_account_number.to_string(),
        }
    }

    /// Create a CorruptAggregate error
    pub fn corrupt_aggregate(branch_id: &str) -> Self {
        StoreError::CorruptAggregate {
            branch_id: branch_id.to_string(),
        }
    }

    /// Create an InvalidKey error
    pub fn invalid_key(field: &'static str, value: &str) -> Self {
        StoreError::InvalidKey {
            field,
            value: value.to_string(),
        }
    }

    /// Create an InvalidAttribute error
    pub fn invalid_attribute(key: &str) -> Self {
        StoreError::InvalidAttribute {
            key: key.to_string(),
        }
    }

    /// Whether this error means the referenced branch or billing row is absent
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::BranchNotFound { .. }
                | StoreError::BillingNotFound { .. }
                | StoreError::BillingNumberUnresolved { .. }
        )
    }
}

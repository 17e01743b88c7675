//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `row`: Physical row shape and reserved attribute names
//! - `account`: The assembled Account aggregate and write outcomes
//! - `error`: Error types for the store and storage backends

pub mod account;
pub mod error;
pub mod row;

pub use account::{Account, AppendOutcome, BillingAccount, DeletedAccount, DeletedBilling};
pub use error::{StoreError, TableError};
pub use row::{Attributes, BillingAccountNumber, BranchId, Row};

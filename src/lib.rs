//! Branch Accounts Library
//! # Overview
//!
//! This library manages branch accounts stored as sparse rows in a single
//! key-value table and rebuilds each account aggregate on read.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Row, Account, errors)
//! - [`core`] - Data-access components:
//!   - [`core::traits`] - The storage contract a backend implements
//!   - [`core::merge`] - Pure assembly of an Account from one partition
//!   - [`core::aggregate_store`] - Create, read, append and cascading delete
//!   - [`core::reverse_index`] - Billing number to branch resolution
//! - [`storage`] - In-memory table and its JSON snapshots
//! - [`config`] - Table configuration
//! - [`cli`] - Command-line adapter and request dispatch
//! - [`io`] - CSV export
//!
//! # Row Layout
//!
//! All rows of one account share the partition key `branchId`. The sort key
//! `billingAccountNumber` tells them apart:
//!
//! - **Master row**: sort key `"null"`; carries `crmId` and any attribute set later
//! - **Billing row**: sort key is the billing number; carries `serviceAccountNumber`,
//!   an append-only list without duplicates
//!
//! # Outcomes
//!
//! Operations return typed results: `NotFound` variants when a branch or
//! billing row is absent, `CorruptAggregate` when billing rows have lost
//! their master row, and `AppendOutcome::Conflict` when an append finds its
//! value already present.

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod storage;
pub mod types;

pub use config::TableConfig;
pub use crate::core::{AccountStore, ReverseIndex, TableClient};
pub use storage::MemoryTable;
pub use types::{
    Account, AppendOutcome, BillingAccount, DeletedAccount, DeletedBilling, Row, StoreError,
    TableError,
};

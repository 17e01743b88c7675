//! Core business logic module
//!
//! This module contains the branch account data-access components:
//! - `traits` - The storage contract backends implement
//! - `merge` - Pure assembly of an Account from one partition's rows
//! - `aggregate_store` - Create, read, append and cascading delete of accounts
//! - `reverse_index` - Billing number to branch resolution

pub mod aggregate_store;
pub mod merge;
pub mod reverse_index;
pub mod traits;

pub use aggregate_store::AccountStore;
pub use merge::merge_partition;
pub use reverse_index::ReverseIndex;
pub use traits::{ConditionalAppend, TableClient};

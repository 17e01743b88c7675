use crate::config::{TableConfig, DEFAULT_DATA_FILE, DEFAULT_TABLE_NAME};
use crate::types::row::BILLING_ACCOUNT_NUMBER;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Manage branch accounts stored as sparse rows in a key-value table
#[derive(Parser, Debug)]
#[command(name = "branch-accounts")]
#[command(about = "Manage branch accounts stored as sparse rows in a key-value table", long_about = None)]
pub struct CliArgs {
    /// Table name recorded in the snapshot
    #[arg(
        long = "table",
        value_name = "NAME",
        env = "BRANCH_TABLE",
        default_value = DEFAULT_TABLE_NAME,
        global = true,
        help = "Table name recorded in and checked against the snapshot"
    )]
    pub table: String,

    /// Snapshot file holding the table rows
    #[arg(
        long = "data",
        value_name = "FILE",
        env = "BRANCH_DATA_FILE",
        default_value = DEFAULT_DATA_FILE,
        global = true,
        help = "Snapshot file the table is loaded from and saved to"
    )]
    pub data_file: PathBuf,

    /// Attributes served by a secondary index
    #[arg(
        long = "index",
        value_name = "ATTRIBUTE",
        env = "BRANCH_INDEXES",
        value_delimiter = ',',
        default_value = BILLING_ACCOUNT_NUMBER,
        global = true,
        help = "Attribute to index for lookups; repeat or comma-separate (billingAccountNumber is always indexed)"
    )]
    pub indexes: Vec<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    #[command(flatten)]
    Op(Operation),

    /// Write every row of the table to stdout as CSV
    Export,
}

/// Operations served by the aggregate store and the reverse index
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Operation {
    /// Create (or replace) the master account of a branch
    Create { branch_id: String, crm_id: String },

    /// Show the merged account of a branch
    Get { branch_id: String },

    /// Add a billing account under an existing branch
    AddBilling {
        branch_id: String,
        billing_account_number: String,
    },

    /// Set one attribute on the master account (VALUE is JSON, or a plain string)
    Set {
        branch_id: String,
        key: String,
        value: String,
    },

    /// Append a service account number to a billing account
    AppendService {
        branch_id: String,
        billing_account_number: String,
        service_account_number: String,
    },

    /// Delete a branch and all of its billing accounts
    Delete { branch_id: String },

    /// Find the branch owning a billing account number
    Resolve { billing_account_number: String },

    /// Delete one billing account by number
    DeleteBilling { billing_account_number: String },
}

impl Operation {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Create { .. } => "create_account",
            Operation::Get { .. } => "get_account",
            Operation::AddBilling { .. } => "add_billing_account",
            Operation::Set { .. } => "set_master_attribute",
            Operation::AppendService { .. } => "append_service_account",
            Operation::Delete { .. } => "delete_account",
            Operation::Resolve { .. } => "resolve_branch",
            Operation::DeleteBilling { .. } => "delete_billing",
        }
    }

    /// Whether the operation can write to the table
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Operation::Get { .. } | Operation::Resolve { .. })
    }
}

impl CliArgs {
    /// Create a TableConfig from CLI arguments
    pub fn to_table_config(&self) -> TableConfig {
        TableConfig::new(self.table.clone(), self.data_file.clone())
            .with_indexed_attributes(self.indexes.iter().cloned())
    }
}

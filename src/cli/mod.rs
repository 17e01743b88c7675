// CLI module
// Command-line interface, argument parsing and request dispatch

mod args;
pub mod dispatch;

pub use args::{CliArgs, Command, Operation};
pub use dispatch::{dispatch, Response};

use crate::config::TableConfig;
use crate::core::{AccountStore, ReverseIndex};
use crate::io::write_rows_csv;
use crate::storage::snapshot;
use clap::Parser;
use std::io::Write;
use std::sync::Arc;

/// Parse command-line arguments using clap
///
/// If parsing fails (invalid arguments, missing required arguments, or
/// --help), clap displays an error message or help text and exits the
/// process.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}

/// Run one command against the table snapshot named by `config`
///
/// Locks and loads the snapshot, runs the command, saves the snapshot again
/// if a writing command succeeded, and writes the result to `output`: a JSON
/// response for operations, CSV for `export`. The lock is held across the
/// whole cycle, so concurrent invocations on one data file run one at a time.
///
/// # Returns
///
/// * `Ok(status)` - The response status code (200 for export)
/// * `Err(String)` - If the snapshot cannot be loaded or saved, or output fails
pub async fn run(
    command: &Command,
    config: &TableConfig,
    output: &mut dyn Write,
) -> Result<u16, String> {
    // Held until the end of the cycle so concurrent invocations serialize
    let _lock = snapshot::lock(config)
        .await
        .map_err(|e| format!("Failed to lock {}: {}", config.data_file.display(), e))?;
    let table = snapshot::load(config)
        .await
        .map_err(|e| format!("Failed to load {}: {}", config.data_file.display(), e))?;

    let operation = match command {
        Command::Export => {
            write_rows_csv(&table.scan(), output)?;
            return Ok(200);
        }
        Command::Op(operation) => operation,
    };

    let table = Arc::new(table);
    let store = AccountStore::new(Arc::clone(&table));
    let index = ReverseIndex::new(Arc::clone(&table));
    let response = dispatch(&store, &index, operation).await;

    if operation.is_mutating() && response.status_code == 200 {
        snapshot::save(&table, config)
            .await
            .map_err(|e| format!("Failed to save {}: {}", config.data_file.display(), e))?;
    }

    let rendered = serde_json::to_string_pretty(&response)
        .map_err(|e| format!("Failed to render response: {}", e))?;
    writeln!(output, "{}", rendered).map_err(|e| format!("Failed to write output: {}", e))?;

    Ok(response.status_code)
}

//! Branch accounts CLI
//!
//! Command-line adapter over the branch account store. Each invocation loads
//! the table snapshot, runs one operation, saves the snapshot if the
//! operation can write, and prints the response as JSON.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- create B1 C1
//! cargo run -- add-billing B1 100
//! cargo run -- append-service B1 100 S1
//! cargo run -- get B1
//! cargo run -- resolve 100
//! cargo run -- --data accounts.json export > rows.csv
//! ```
//!
//! Logs go to stderr; set `RUST_LOG` (default `warn`) to see more.
//!
//! # Exit Codes
//!
//! - 0: The operation completed (including not-found and conflict outcomes)
//! - 1: Snapshot or output failure, or a 5xx response

use branch_accounts::cli;
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();
    let config = args.to_table_config();

    let mut output = std::io::stdout();
    match cli::run(&args.command, &config, &mut output).await {
        Ok(status) if status >= 500 => process::exit(1),
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

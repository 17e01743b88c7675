//! Snapshot persistence for the in-memory table
//!
//! A snapshot is a JSON document holding the table name and every row:
//!
//! ```text
//! { "table": "Branch", "rows": [ { "branchId": ..., "billingAccountNumber": ..., ... } ] }
//! ```
//!
//! Saves are atomic. The document is written to a temporary file in the
//! target directory and then renamed over the target, so a crash mid-save
//! leaves the previous snapshot intact.
//!
//! Separate processes share one snapshot file, so a load-modify-save cycle
//! must run under [`lock`]. The lock is an exclusive advisory lock on a
//! sidecar `<data file>.lock` and is released when the guard drops.

use crate::config::TableConfig;
use crate::storage::MemoryTable;
use crate::types::{Row, TableError};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    table: String,
    rows: Vec<Row>,
}

/// Exclusive hold on a snapshot file, released on drop
#[derive(Debug)]
pub struct SnapshotLock {
    _file: File,
}

/// Path of the sidecar lock file for `data_file`
pub fn lock_path(data_file: &Path) -> PathBuf {
    let mut name = data_file.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}

/// Wait for exclusive access to the snapshot named by `config`
///
/// Blocks on the blocking pool until every other holder, in this process or
/// another, has dropped its guard.
pub async fn lock(config: &TableConfig) -> Result<SnapshotLock, TableError> {
    let path = lock_path(&config.data_file);

    let lock = tokio::task::spawn_blocking(move || acquire(&path))
        .await
        .map_err(|e| TableError::io(e.to_string()))??;

    tracing::debug!(path = %config.data_file.display(), "Locked snapshot");
    Ok(lock)
}

fn acquire(path: &Path) -> Result<SnapshotLock, TableError> {
    std::fs::create_dir_all(parent_dir(path))?;
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)?;
    FileExt::lock_exclusive(&file)
        .map_err(|e| TableError::io(format!("failed to lock {}: {}", path.display(), e)))?;
    Ok(SnapshotLock { _file: file })
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Load the table described by `config`
///
/// A missing snapshot file loads as an empty table.
///
/// # Errors
///
/// * `TableError::Io` - The file exists but cannot be read
/// * `TableError::Codec` - The file is not a valid snapshot
/// * `TableError::TableMismatch` - The snapshot belongs to another table
pub async fn load(config: &TableConfig) -> Result<MemoryTable, TableError> {
    let table = MemoryTable::with_indexes(config.indexed_attributes.iter().cloned());

    let bytes = match tokio::fs::read(&config.data_file).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %config.data_file.display(), "No snapshot, starting empty");
            return Ok(table);
        }
        Err(e) => return Err(e.into()),
    };

    let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
    if snapshot.table != config.table_name {
        return Err(TableError::TableMismatch {
            expected: config.table_name.clone(),
            found: snapshot.table,
        });
    }

    tracing::debug!(
        path = %config.data_file.display(),
        rows = snapshot.rows.len(),
        "Loaded snapshot"
    );
    table.insert_rows(snapshot.rows);
    Ok(table)
}

/// Save every row of `table` to the snapshot file named by `config`
pub async fn save(table: &MemoryTable, config: &TableConfig) -> Result<(), TableError> {
    let snapshot = Snapshot {
        table: config.table_name.clone(),
        rows: table.scan(),
    };
    let bytes = serde_json::to_vec_pretty(&snapshot)?;
    let path = config.data_file.clone();
    let rows = snapshot.rows.len();

    tokio::task::spawn_blocking(move || write_atomically(&path, &bytes))
        .await
        .map_err(|e| TableError::io(e.to_string()))??;

    tracing::debug!(path = %config.data_file.display(), rows, "Saved snapshot");
    Ok(())
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), TableError> {
    let dir = parent_dir(path);
    std::fs::create_dir_all(&dir)?;

    let mut file = NamedTempFile::new_in(&dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| TableError::from(e.error))?;
    Ok(())
}

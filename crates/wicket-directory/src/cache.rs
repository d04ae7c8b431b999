//! Local JSON cache of the last synced record set.
//!
//! The device persists each successful sync so it can boot with a
//! usable directory while offline. The cache is a plain JSON array of
//! user records.

use crate::snapshot::DirectorySnapshot;
use std::fs;
use std::path::Path;
use tracing::info;
use wicket_core::{Error, Result, UserRecord};

/// Write the snapshot's records to the cache file.
///
/// The parent directory is created if missing. The write is
/// whole-file; a torn write surfaces as a parse error on the next load
/// rather than a silently wrong directory.
///
/// # Errors
/// Returns an IO error on write failure.
pub fn store(path: &Path, snapshot: &DirectorySnapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let records = snapshot.records();
    let json = serde_json::to_string_pretty(&records)
        .map_err(|e| Error::Serialization(e.to_string()))?;
    fs::write(path, json)?;
    info!(users = records.len(), path = %path.display(), "directory cache written");
    Ok(())
}

/// Load records from the cache file and build a snapshot.
///
/// # Errors
/// Returns an IO error if the file is unreadable, a serialization
/// error if it does not parse, or `Error::DuplicatePin` if the cached
/// set is inconsistent.
pub fn load(path: &Path) -> Result<DirectorySnapshot> {
    let json = fs::read_to_string(path)?;
    let records: Vec<UserRecord> =
        serde_json::from_str(&json).map_err(|e| Error::Serialization(e.to_string()))?;
    info!(users = records.len(), path = %path.display(), "directory cache loaded");
    DirectorySnapshot::from_records(records)
}

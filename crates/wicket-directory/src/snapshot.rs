//! Directory snapshots and the atomic snapshot holder.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::info;
use wicket_core::{Error, Result, UserRecord};

/// An immutable point-in-time set of authorized users, keyed by PIN.
///
/// Lookup is O(1) expected. PIN uniqueness is a construction invariant:
/// [`DirectorySnapshot::from_records`] rejects duplicates outright.
#[derive(Debug, Clone)]
pub struct DirectorySnapshot {
    users: HashMap<String, Arc<UserRecord>>,
    synced_at: DateTime<Utc>,
}

impl DirectorySnapshot {
    /// An empty snapshot (device booted before any sync).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            users: HashMap::new(),
            synced_at: Utc::now(),
        }
    }

    /// Build a snapshot from synced records.
    ///
    /// # Errors
    /// Returns `Error::DuplicatePin` if two records share a PIN; the
    /// whole update is rejected in that case.
    pub fn from_records(records: Vec<UserRecord>) -> Result<Self> {
        let mut users = HashMap::with_capacity(records.len());
        for record in records {
            let pin = record.pin.as_str().to_string();
            if users.insert(pin.clone(), Arc::new(record)).is_some() {
                return Err(Error::DuplicatePin(pin));
            }
        }
        Ok(Self {
            users,
            synced_at: Utc::now(),
        })
    }

    /// Look up a user by entered PIN.
    #[must_use]
    pub fn lookup(&self, pin: &str) -> Option<Arc<UserRecord>> {
        self.users.get(pin).cloned()
    }

    /// Number of authorized users in this snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Check whether the snapshot holds no users.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// When this snapshot was built.
    #[must_use]
    pub fn synced_at(&self) -> DateTime<Utc> {
        self.synced_at
    }

    /// Clone out the raw records, for cache persistence.
    #[must_use]
    pub fn records(&self) -> Vec<UserRecord> {
        self.users.values().map(|u| (**u).clone()).collect()
    }
}

/// Shared holder for the current directory snapshot.
///
/// Reads are lock-cheap clone-of-`Arc`; installs swap the whole
/// snapshot atomically. The decision pipeline reads many times per
/// snapshot; the sync side replaces it rarely.
#[derive(Debug)]
pub struct UserDirectory {
    current: RwLock<Arc<DirectorySnapshot>>,
}

impl UserDirectory {
    /// Create a directory with an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(DirectorySnapshot::empty())),
        }
    }

    /// Create a directory starting from a prebuilt snapshot.
    #[must_use]
    pub fn with_snapshot(snapshot: DirectorySnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Look up a user by entered PIN in the current snapshot.
    ///
    /// The returned record is pinned to the snapshot it came from; a
    /// concurrent install cannot change it mid-decision.
    #[must_use]
    pub fn lookup(&self, pin: &str) -> Option<Arc<UserRecord>> {
        self.snapshot().lookup(pin)
    }

    /// Get the current snapshot.
    ///
    /// A poisoned lock still yields the last installed snapshot; the
    /// critical sections here only swap an `Arc` and cannot leave it
    /// half-written.
    #[must_use]
    pub fn snapshot(&self) -> Arc<DirectorySnapshot> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Install a new snapshot atomically.
    pub fn install(&self, snapshot: DirectorySnapshot) {
        let users = snapshot.len();
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Arc::new(snapshot);
        info!(users, "directory snapshot installed");
    }

    /// Build and install a snapshot from records.
    ///
    /// # Errors
    /// Returns `Error::DuplicatePin` without touching the current
    /// snapshot if the records are inconsistent.
    pub fn replace_with(&self, records: Vec<UserRecord>) -> Result<()> {
        let snapshot = DirectorySnapshot::from_records(records)?;
        self.install(snapshot);
        Ok(())
    }
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wicket_core::{ImageHandle, PinCode};

    fn user(id: &str, pin: &str) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            pin: PinCode::new(pin, 4).unwrap(),
            name: id.to_string(),
            reference_image: ImageHandle::new(format!("images/{id}.jpg")),
        }
    }

    #[test]
    fn test_lookup_hit_and_miss() {
        let snapshot =
            DirectorySnapshot::from_records(vec![user("alice", "1234"), user("bob", "4321")])
                .unwrap();

        assert_eq!(snapshot.lookup("1234").unwrap().id, "alice");
        assert_eq!(snapshot.lookup("4321").unwrap().id, "bob");
        assert!(snapshot.lookup("9999").is_none());
    }

    #[test]
    fn test_duplicate_pin_rejects_whole_snapshot() {
        let result =
            DirectorySnapshot::from_records(vec![user("alice", "1234"), user("mallory", "1234")]);
        assert!(matches!(result, Err(Error::DuplicatePin(p)) if p == "1234"));
    }

    #[test]
    fn test_rejected_update_keeps_last_valid_snapshot() {
        let directory = UserDirectory::new();
        directory
            .replace_with(vec![user("alice", "1234")])
            .unwrap();

        let result =
            directory.replace_with(vec![user("bob", "1111"), user("mallory", "1111")]);
        assert!(result.is_err());

        // Stale-but-consistent: alice is still there, bob never arrived.
        assert_eq!(directory.lookup("1234").unwrap().id, "alice");
        assert!(directory.lookup("1111").is_none());
    }

    #[test]
    fn test_record_is_pinned_to_its_snapshot() {
        let directory = UserDirectory::new();
        directory
            .replace_with(vec![user("alice", "1234")])
            .unwrap();

        let record = directory.lookup("1234").unwrap();
        directory.replace_with(vec![user("bob", "4321")]).unwrap();

        // The record fetched before the install is unchanged.
        assert_eq!(record.id, "alice");
        assert!(directory.lookup("1234").is_none());
    }

    #[test]
    fn test_empty_directory() {
        let directory = UserDirectory::default();
        assert!(directory.snapshot().is_empty());
        assert!(directory.lookup("0000").is_none());
    }
}

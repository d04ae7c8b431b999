//! Out-of-band directory synchronization.

#![allow(async_fn_in_trait)]

use crate::snapshot::UserDirectory;
use tracing::{info, warn};
use wicket_core::{Error, Result, UserRecord};

/// Upstream source of authorized-user records.
///
/// Implemented by the cloud-database download pipeline in deployment
/// builds; tests use an in-memory source. Invoked out of band from the
/// decision pipeline.
pub trait DirectorySync: Send + Sync {
    /// Fetch the complete current record set.
    ///
    /// # Errors
    ///
    /// Returns `Error::SyncFailed` if the upstream cannot be reached or
    /// returns an unusable payload.
    async fn fetch_records(&self) -> Result<Vec<UserRecord>>;
}

/// Fetch from the upstream and install the result as the new snapshot.
///
/// On any failure — fetch or duplicate-PIN rejection — the directory
/// keeps its last valid snapshot and the error is returned for the
/// caller to log or retry on its own schedule.
///
/// # Errors
///
/// Propagates `Error::SyncFailed` from the source and
/// `Error::DuplicatePin` from snapshot construction.
pub async fn refresh<S: DirectorySync>(directory: &UserDirectory, source: &S) -> Result<usize> {
    let records = source.fetch_records().await.inspect_err(|e| {
        warn!(error = %e, "directory sync fetch failed, keeping current snapshot");
    })?;
    let count = records.len();

    directory.replace_with(records).inspect_err(|e| {
        warn!(error = %e, "directory update rejected, keeping current snapshot");
    })?;

    info!(users = count, "directory refreshed");
    Ok(count)
}

/// A sync source that always fails, for wiring up devices that only
/// ever run from the local cache.
#[derive(Debug, Default)]
pub struct OfflineSync;

impl DirectorySync for OfflineSync {
    async fn fetch_records(&self) -> Result<Vec<UserRecord>> {
        Err(Error::SyncFailed("device is offline".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wicket_core::{ImageHandle, PinCode};

    struct FixedSync(Vec<UserRecord>);

    impl DirectorySync for FixedSync {
        async fn fetch_records(&self) -> Result<Vec<UserRecord>> {
            Ok(self.0.clone())
        }
    }

    fn user(id: &str, pin: &str) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            pin: PinCode::new(pin, 4).unwrap(),
            name: id.to_string(),
            reference_image: ImageHandle::new(format!("images/{id}.jpg")),
        }
    }

    #[tokio::test]
    async fn test_refresh_installs_fetched_records() {
        let directory = UserDirectory::new();
        let source = FixedSync(vec![user("alice", "1234"), user("bob", "4321")]);

        let count = refresh(&directory, &source).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(directory.lookup("1234").unwrap().id, "alice");
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_snapshot() {
        let directory = UserDirectory::new();
        directory.replace_with(vec![user("alice", "1234")]).unwrap();

        let result = refresh(&directory, &OfflineSync).await;
        assert!(result.is_err());
        assert_eq!(directory.lookup("1234").unwrap().id, "alice");
    }

    #[tokio::test]
    async fn test_inconsistent_fetch_keeps_snapshot() {
        let directory = UserDirectory::new();
        directory.replace_with(vec![user("alice", "1234")]).unwrap();

        let source = FixedSync(vec![user("bob", "2222"), user("mallory", "2222")]);
        let result = refresh(&directory, &source).await;
        assert!(matches!(result, Err(Error::DuplicatePin(_))));
        assert_eq!(directory.lookup("1234").unwrap().id, "alice");
        assert!(directory.lookup("2222").is_none());
    }
}

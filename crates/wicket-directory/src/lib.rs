//! Authorized-user directory.
//!
//! The directory is a point-in-time, read-only mapping from PIN to
//! [`UserRecord`]. An external sync process builds a complete snapshot
//! out of band and installs it wholesale; readers never observe a
//! partially updated directory, and a rejected update (duplicate PINs)
//! leaves the last valid snapshot in place — stale-but-consistent over
//! corrupt-but-fresh.

pub mod cache;
pub mod snapshot;
pub mod sync;

pub use snapshot::{DirectorySnapshot, UserDirectory};
pub use sync::{DirectorySync, OfflineSync, refresh};

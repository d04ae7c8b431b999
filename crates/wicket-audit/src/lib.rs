//! Tiered decision recording.
//!
//! Every completed access attempt is written to a local append-only
//! log before anything else happens — that file is the system of
//! record for the audit trail. The same record is then forwarded to a
//! remote sink on a best-effort background task that can lag, time
//! out, or fail without ever touching the local tier.

pub mod appender;
pub mod logger;
pub mod publish;

pub use appender::{FileAppender, LocalAppend, MemoryAppender};
pub use logger::EventLogger;
pub use publish::{ChannelPublisher, FailingPublisher, NoopPublisher, PublishError, RemotePublish};

//! Best-effort remote forwarding tier.

#![allow(async_fn_in_trait)]

use thiserror::Error;
use tokio::sync::mpsc;

/// Failure forwarding a record to the remote sink.
///
/// Publish errors are advisory. The local tier has already accepted
/// the record by the time a publish is attempted, so these never fail
/// an access cycle.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The sink rejected or could not accept the record.
    #[error("remote sink unavailable: {0}")]
    Unavailable(String),

    /// The sink did not respond within the configured window.
    #[error("publish timed out after {0}ms")]
    Timeout(u64),
}

/// Asynchronous forwarding of one serialized record to a remote sink.
///
/// Implementations are cloned into a background task per record, so
/// they must be cheap to clone (hold channels or handles, not
/// connections).
pub trait RemotePublish: Clone + Send + Sync + 'static {
    /// Forward one serialized record line.
    ///
    /// # Errors
    ///
    /// Returns a [`PublishError`] if delivery could not be confirmed.
    fn publish(
        &self,
        record: String,
    ) -> impl std::future::Future<Output = Result<(), PublishError>> + Send;
}

/// Publisher that discards every record successfully.
///
/// Used when the controller runs without a remote tier configured.
#[derive(Debug, Clone, Default)]
pub struct NoopPublisher;

impl NoopPublisher {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl RemotePublish for NoopPublisher {
    async fn publish(&self, _record: String) -> Result<(), PublishError> {
        Ok(())
    }
}

/// Publisher that delivers records into a tokio channel.
///
/// Tests receive the channel's other end and can assert on exactly
/// what reached the remote tier and in what order.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelPublisher {
    /// Create a publisher and the receiver its records arrive on.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl RemotePublish for ChannelPublisher {
    async fn publish(&self, record: String) -> Result<(), PublishError> {
        self.tx
            .send(record)
            .map_err(|_| PublishError::Unavailable("receiver dropped".to_string()))
    }
}

/// Publisher whose every delivery fails.
#[derive(Debug, Clone, Default)]
pub struct FailingPublisher;

impl FailingPublisher {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl RemotePublish for FailingPublisher {
    async fn publish(&self, _record: String) -> Result<(), PublishError> {
        Err(PublishError::Unavailable(
            "publisher configured to fail".to_string(),
        ))
    }
}

//! Two-tier decision logger.

use std::time::Duration;

use tracing::{debug, warn};

use wicket_core::{ControllerConfig, Decision, Error, Result};

use crate::appender::LocalAppend;
use crate::publish::{NoopPublisher, RemotePublish};

/// Records completed access decisions, local tier first.
///
/// `record` serializes the decision to one JSON line, appends it to the
/// local tier, and only then hands the same line to the remote tier on
/// a detached task. The local append is the system of record: its
/// failure is the only way `record` can error. Remote delivery runs
/// under a timeout and logs its own failures without reporting them
/// back.
pub struct EventLogger<A: LocalAppend, P: RemotePublish> {
    appender: A,
    publisher: Option<P>,
    publish_timeout: Duration,
}

impl<A: LocalAppend> EventLogger<A, NoopPublisher> {
    /// Create a logger with no remote tier.
    pub fn local_only(appender: A) -> Self {
        Self {
            appender,
            publisher: None,
            publish_timeout: Duration::ZERO,
        }
    }
}

impl<A: LocalAppend, P: RemotePublish> EventLogger<A, P> {
    /// Create a logger forwarding to a remote sink with the configured
    /// per-record delivery window.
    pub fn new(config: &ControllerConfig, appender: A, publisher: P) -> Self {
        Self {
            appender,
            publisher: Some(publisher),
            publish_timeout: config.publish_timeout(),
        }
    }

    /// Record one decision.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the decision cannot be
    /// encoded, or [`Error::AuditWrite`] if the local append fails.
    /// Remote delivery failures never surface here.
    pub fn record(&self, decision: &Decision) -> Result<()> {
        let line = serde_json::to_string(decision)
            .map_err(|e| Error::Serialization(e.to_string()))?;

        self.appender
            .append_line(&line)
            .map_err(|e| Error::AuditWrite(e.to_string()))?;

        if let Some(publisher) = &self.publisher {
            let publisher = publisher.clone();
            let timeout = self.publish_timeout;
            tokio::spawn(async move {
                match tokio::time::timeout(timeout, publisher.publish(line)).await {
                    Ok(Ok(())) => debug!("decision forwarded to remote sink"),
                    Ok(Err(e)) => warn!(error = %e, "remote publish failed"),
                    Err(_) => warn!(
                        timeout_ms = timeout.as_millis() as u64,
                        "remote publish timed out"
                    ),
                }
            });
        }

        Ok(())
    }
}

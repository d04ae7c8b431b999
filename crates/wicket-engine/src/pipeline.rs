//! Keypad-to-decision wiring.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use wicket_audit::{LocalAppend, RemotePublish};
use wicket_core::{ControllerConfig, Edge, KeyEvent, Result};
use wicket_keypad::{PinAccumulator, PinEvent};
use wicket_vision::VerifyIdentity;

use crate::engine::DecisionEngine;

/// How often the accumulator is swept for a stale partial entry, so
/// abandoned digits expire even when no further key arrives.
const IDLE_SWEEP_INTERVAL: Duration = Duration::from_millis(250);

/// Consumes the debounced key event stream and drives the engine.
///
/// Owns the PIN accumulator and the idle-expiry sweep. One pipeline
/// runs per device; it processes events strictly in arrival order, so
/// a submit that lands while a verification is in flight waits in the
/// channel until the current cycle completes.
pub struct AccessPipeline<V, A, P>
where
    V: VerifyIdentity,
    A: LocalAppend,
    P: RemotePublish,
{
    accumulator: PinAccumulator,
    engine: DecisionEngine<V, A, P>,
}

impl<V, A, P> AccessPipeline<V, A, P>
where
    V: VerifyIdentity,
    A: LocalAppend,
    P: RemotePublish,
{
    /// Create a pipeline around a decision engine.
    pub fn new(config: &ControllerConfig, engine: DecisionEngine<V, A, P>) -> Self {
        Self {
            accumulator: PinAccumulator::new(config),
            engine,
        }
    }

    /// Run until the key event stream closes.
    ///
    /// # Errors
    ///
    /// Returns an error if a decision could not be written to the
    /// local audit tier. An unrecordable decision stops the device
    /// rather than letting attempts go unlogged.
    pub async fn run(mut self, mut events: mpsc::Receiver<KeyEvent>) -> Result<()> {
        let mut sweep = tokio::time::interval(IDLE_SWEEP_INTERVAL);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                maybe = events.recv() => {
                    match maybe {
                        Some(event) => self.handle_key(event).await?,
                        None => break,
                    }
                }
                _ = sweep.tick() => {
                    self.accumulator.expire_if_idle(Instant::now());
                }
            }
        }

        debug!("key event stream closed, pipeline stopping");
        Ok(())
    }

    async fn handle_key(&mut self, event: KeyEvent) -> Result<()> {
        if event.edge != Edge::Pressed {
            return Ok(());
        }

        let Some(pin_event) = self.accumulator.apply(event.symbol, Instant::now()) else {
            return Ok(());
        };

        match pin_event {
            PinEvent::Submitted(pin) => {
                self.engine.decide(&pin).await?;
            }
            PinEvent::ShortSubmit { entered } => {
                self.engine.decide(&entered).await?;
            }
            // A cancelled entry never reaches the engine and leaves no
            // audit record.
            PinEvent::Cancelled => {
                info!("entry cancelled before submission");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use wicket_audit::{EventLogger, MemoryAppender, NoopPublisher};
    use wicket_core::{
        ImageHandle, MatchReason, MatchResult, PinCode, ReservedKey, Symbol, UserRecord,
    };
    use wicket_directory::{DirectorySnapshot, UserDirectory};

    /// Verifier that always fails closed; used where the face phase
    /// must not matter.
    struct ClosedVerifier;

    impl VerifyIdentity for ClosedVerifier {
        async fn verify(&mut self, _user: &UserRecord) -> MatchResult {
            MatchResult::failed(MatchReason::MatcherError)
        }
    }

    fn directory() -> Arc<UserDirectory> {
        let alice = UserRecord {
            id: "alice".into(),
            pin: PinCode::new("1234", 4).unwrap(),
            name: "Alice".into(),
            reference_image: ImageHandle::new("images/alice.jpg"),
        };
        let snapshot = DirectorySnapshot::from_records(vec![alice]).unwrap();
        Arc::new(UserDirectory::with_snapshot(snapshot))
    }

    fn pin_only_pipeline(
        config: &ControllerConfig,
        appender: Arc<MemoryAppender>,
    ) -> AccessPipeline<ClosedVerifier, Arc<MemoryAppender>, NoopPublisher> {
        let engine = DecisionEngine::new(
            config,
            directory(),
            None,
            EventLogger::local_only(appender),
        );
        AccessPipeline::new(config, engine)
    }

    async fn feed(events: &[Symbol]) -> Vec<String> {
        let config = ControllerConfig::default();
        let appender = Arc::new(MemoryAppender::new());
        let pipeline = pin_only_pipeline(&config, appender.clone());

        let (tx, rx) = mpsc::channel(32);
        for &symbol in events {
            tx.send(KeyEvent::pressed(symbol)).await.unwrap();
        }
        drop(tx);

        pipeline.run(rx).await.unwrap();
        appender.lines()
    }

    #[tokio::test]
    async fn test_submit_produces_one_decision() {
        let lines = feed(&[
            Symbol::Digit(1),
            Symbol::Digit(2),
            Symbol::Digit(3),
            Symbol::Digit(4),
            Symbol::Submit,
        ])
        .await;

        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("\"outcome\":\"granted\""));
    }

    #[tokio::test]
    async fn test_cleared_entry_leaves_no_record() {
        let lines = feed(&[
            Symbol::Digit(1),
            Symbol::Digit(2),
            Symbol::Clear,
            Symbol::Digit(1),
            Symbol::Digit(2),
            Symbol::Digit(3),
            Symbol::Digit(4),
            Symbol::Submit,
        ])
        .await;

        assert_eq!(lines.len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_key_produces_no_decision() {
        let config = ControllerConfig::builder()
            .cancel_key(ReservedKey::D)
            .build()
            .unwrap();
        let appender = Arc::new(MemoryAppender::new());
        let pipeline = pin_only_pipeline(&config, appender.clone());

        let (tx, rx) = mpsc::channel(8);
        for symbol in [
            Symbol::Digit(1),
            Symbol::Digit(2),
            Symbol::Reserved(ReservedKey::D),
        ] {
            tx.send(KeyEvent::pressed(symbol)).await.unwrap();
        }
        drop(tx);

        pipeline.run(rx).await.unwrap();
        assert!(appender.lines().is_empty());
    }

    #[tokio::test]
    async fn test_release_edges_are_ignored() {
        let config = ControllerConfig::default();
        let appender = Arc::new(MemoryAppender::new());
        let pipeline = pin_only_pipeline(&config, appender.clone());

        let (tx, rx) = mpsc::channel(16);
        for digit in [1, 2, 3, 4] {
            tx.send(KeyEvent::pressed(Symbol::Digit(digit)))
                .await
                .unwrap();
            tx.send(KeyEvent::released(Symbol::Digit(digit)))
                .await
                .unwrap();
        }
        tx.send(KeyEvent::pressed(Symbol::Submit)).await.unwrap();
        drop(tx);

        pipeline.run(rx).await.unwrap();

        let lines = appender.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("\"pin_entered\":\"1234\""));
    }

    #[tokio::test]
    async fn test_short_submit_records_malformed_denial_when_opted_in() {
        let config = ControllerConfig::builder()
            .submit_short_pin_rejects(true)
            .build()
            .unwrap();
        let appender = Arc::new(MemoryAppender::new());
        let pipeline = pin_only_pipeline(&config, appender.clone());

        let (tx, rx) = mpsc::channel(8);
        for symbol in [Symbol::Digit(7), Symbol::Digit(7), Symbol::Submit] {
            tx.send(KeyEvent::pressed(symbol)).await.unwrap();
        }
        drop(tx);

        pipeline.run(rx).await.unwrap();

        let lines = appender.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("\"reason\":\"malformed_pin\""));
        assert!(lines[0].contains("\"pin_entered\":\"77\""));
    }
}

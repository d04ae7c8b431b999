//! The fail-closed decision engine.

use std::sync::Arc;

use tracing::{info, warn};

use wicket_audit::{EventLogger, LocalAppend, RemotePublish};
use wicket_core::{ControllerConfig, Decision, DenyReason, Result};
use wicket_directory::UserDirectory;
use wicket_vision::VerifyIdentity;

use crate::state::{AccessCycle, AccessState};

/// Turns one submitted PIN into exactly one recorded [`Decision`].
///
/// The engine is fail-closed: the only path to a grant is a directory
/// hit followed by a positive face match (or a deployment that has
/// face verification switched off). Malformed PINs, lookup misses, and
/// every verification fault produce a denial, and each of those
/// outcomes is recorded through the event logger before the cycle
/// re-arms.
///
/// When no verifier is supplied the engine runs PIN-only and grants on
/// a directory hit.
pub struct DecisionEngine<V, A, P>
where
    V: VerifyIdentity,
    A: LocalAppend,
    P: RemotePublish,
{
    directory: Arc<UserDirectory>,
    verifier: Option<V>,
    logger: EventLogger<A, P>,
    cycle: AccessCycle,
    pin_length: usize,
}

impl<V, A, P> DecisionEngine<V, A, P>
where
    V: VerifyIdentity,
    A: LocalAppend,
    P: RemotePublish,
{
    /// Create an engine.
    ///
    /// Pass `None` for the verifier to run PIN-only, mirroring the
    /// `face_verification` configuration switch.
    pub fn new(
        config: &ControllerConfig,
        directory: Arc<UserDirectory>,
        verifier: Option<V>,
        logger: EventLogger<A, P>,
    ) -> Self {
        Self {
            directory,
            verifier,
            logger,
            cycle: AccessCycle::new(),
            pin_length: config.pin_length,
        }
    }

    /// The cycle state machine, for diagnostics.
    pub fn cycle(&self) -> &AccessCycle {
        &self.cycle
    }

    /// Decide one access attempt for a submitted PIN.
    ///
    /// Drives the full cycle: lookup, optional face verification,
    /// decision, and audit recording. Returns the decision that was
    /// recorded.
    ///
    /// # Errors
    ///
    /// Returns an error only if the decision could not be written to
    /// the local audit tier (the record is the system of record; a
    /// cycle that cannot be recorded is a failed cycle). The cycle is
    /// re-armed either way.
    pub async fn decide(&mut self, pin: &str) -> Result<Decision> {
        self.cycle.transition_to(AccessState::PinSubmitted)?;

        let decision = if !self.well_formed(pin) {
            warn!(digits = pin.len(), "malformed PIN submitted");
            Decision::denied(None, pin, DenyReason::MalformedPin)
        } else if let Some(user) = self.directory.lookup(pin) {
            match &mut self.verifier {
                Some(verifier) => {
                    self.cycle.transition_to(AccessState::VerifyingFace)?;
                    let result = verifier.verify(&user).await;
                    if result.matched {
                        Decision::granted(user.id.clone(), pin)
                    } else {
                        Decision::denied(
                            Some(user.id.clone()),
                            pin,
                            DenyReason::from_match_reason(result.reason),
                        )
                    }
                }
                None => Decision::granted(user.id.clone(), pin),
            }
        } else {
            Decision::denied(None, pin, DenyReason::UnknownPin)
        };

        self.cycle.transition_to(AccessState::Decided)?;

        info!(
            outcome = ?decision.outcome,
            user = decision.user_id.as_deref().unwrap_or("-"),
            reason = ?decision.reason,
            "access decision"
        );

        let recorded = self.logger.record(&decision);
        self.cycle.transition_to(AccessState::AwaitingPin)?;
        recorded?;

        Ok(decision)
    }

    /// A well-formed PIN is exactly `pin_length` ASCII digits.
    fn well_formed(&self, pin: &str) -> bool {
        pin.len() == self.pin_length && pin.bytes().all(|b| b.is_ascii_digit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use rstest::rstest;
    use wicket_audit::{MemoryAppender, NoopPublisher};
    use wicket_core::{AccessOutcome, ImageHandle, MatchReason, MatchResult, PinCode, UserRecord};
    use wicket_directory::DirectorySnapshot;

    /// Replays a script of match results; exhausts to matcher faults.
    struct ScriptedVerifier {
        results: VecDeque<MatchResult>,
    }

    impl ScriptedVerifier {
        fn with_results(results: impl IntoIterator<Item = MatchResult>) -> Self {
            Self {
                results: results.into_iter().collect(),
            }
        }

        fn matching() -> Self {
            Self::with_results([MatchResult::acquired(40.0, true)])
        }
    }

    impl VerifyIdentity for ScriptedVerifier {
        async fn verify(&mut self, _user: &UserRecord) -> MatchResult {
            self.results
                .pop_front()
                .unwrap_or_else(|| MatchResult::failed(MatchReason::MatcherError))
        }
    }

    fn user(id: &str, pin: &str) -> UserRecord {
        UserRecord {
            id: id.into(),
            pin: PinCode::new(pin, 4).unwrap(),
            name: id.into(),
            reference_image: ImageHandle::new(format!("images/{id}.jpg")),
        }
    }

    fn directory() -> Arc<UserDirectory> {
        let snapshot =
            DirectorySnapshot::from_records(vec![user("alice", "1234"), user("bob", "5678")])
                .unwrap();
        Arc::new(UserDirectory::with_snapshot(snapshot))
    }

    fn engine_with(
        verifier: Option<ScriptedVerifier>,
        appender: Arc<MemoryAppender>,
    ) -> DecisionEngine<ScriptedVerifier, Arc<MemoryAppender>, NoopPublisher> {
        let config = ControllerConfig::default();
        DecisionEngine::new(
            &config,
            directory(),
            verifier,
            EventLogger::local_only(appender),
        )
    }

    #[tokio::test]
    async fn test_grant_on_pin_hit_and_face_match() {
        let appender = Arc::new(MemoryAppender::new());
        let mut engine = engine_with(Some(ScriptedVerifier::matching()), appender.clone());

        let decision = engine.decide("1234").await.unwrap();

        assert!(decision.is_granted());
        assert_eq!(decision.user_id.as_deref(), Some("alice"));
        assert_eq!(decision.reason, None);
        assert_eq!(appender.lines().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_pin_denied_without_verification() {
        let appender = Arc::new(MemoryAppender::new());
        // A verifier that would grant; it must never be consulted.
        let mut engine = engine_with(Some(ScriptedVerifier::matching()), appender.clone());

        let decision = engine.decide("9999").await.unwrap();

        assert_eq!(decision.outcome, AccessOutcome::Denied);
        assert_eq!(decision.user_id, None);
        assert_eq!(decision.reason, Some(DenyReason::UnknownPin));
        // The face phase never appears in the cycle history.
        assert!(
            engine
                .cycle()
                .history()
                .iter()
                .all(|t| t.to != AccessState::VerifyingFace)
        );
    }

    #[tokio::test]
    async fn test_face_mismatch_denied_with_user_attributed() {
        let appender = Arc::new(MemoryAppender::new());
        let mut engine = engine_with(
            Some(ScriptedVerifier::with_results([MatchResult::acquired(
                75.0, false,
            )])),
            appender.clone(),
        );

        let decision = engine.decide("1234").await.unwrap();

        assert_eq!(decision.outcome, AccessOutcome::Denied);
        assert_eq!(decision.user_id.as_deref(), Some("alice"));
        assert_eq!(decision.reason, Some(DenyReason::FaceMismatch));
    }

    #[rstest]
    #[case(MatchReason::NoFaceDetected, DenyReason::NoFace)]
    #[case(MatchReason::NoReferenceFace, DenyReason::NoReferenceFace)]
    #[case(MatchReason::MatcherError, DenyReason::MatcherError)]
    #[tokio::test]
    async fn test_verification_faults_fail_closed(
        #[case] fault: MatchReason,
        #[case] expected: DenyReason,
    ) {
        let appender = Arc::new(MemoryAppender::new());
        let mut engine = engine_with(
            Some(ScriptedVerifier::with_results([MatchResult::failed(fault)])),
            appender.clone(),
        );

        let decision = engine.decide("1234").await.unwrap();
        assert_eq!(decision.outcome, AccessOutcome::Denied);
        assert_eq!(decision.reason, Some(expected));
    }

    #[rstest]
    #[case("123")]
    #[case("12345")]
    #[case("12a4")]
    #[case("")]
    #[tokio::test]
    async fn test_malformed_pin_denied(#[case] pin: &str) {
        let appender = Arc::new(MemoryAppender::new());
        let mut engine = engine_with(Some(ScriptedVerifier::matching()), appender.clone());

        let decision = engine.decide(pin).await.unwrap();
        assert_eq!(decision.outcome, AccessOutcome::Denied);
        assert_eq!(decision.reason, Some(DenyReason::MalformedPin));
        assert_eq!(decision.pin_entered, pin);
    }

    #[tokio::test]
    async fn test_pin_only_mode_grants_on_directory_hit() {
        let appender = Arc::new(MemoryAppender::new());
        let mut engine = engine_with(None, appender.clone());

        let decision = engine.decide("5678").await.unwrap();
        assert!(decision.is_granted());
        assert_eq!(decision.user_id.as_deref(), Some("bob"));
    }

    #[tokio::test]
    async fn test_repeat_grants_are_idempotent() {
        let appender = Arc::new(MemoryAppender::new());
        let mut engine = engine_with(
            Some(ScriptedVerifier::with_results([
                MatchResult::acquired(40.0, true),
                MatchResult::acquired(42.0, true),
            ])),
            appender.clone(),
        );

        let first = engine.decide("1234").await.unwrap();
        let second = engine.decide("1234").await.unwrap();

        assert!(first.is_granted());
        assert!(second.is_granted());
        assert_eq!(appender.lines().len(), 2);
        assert_eq!(engine.cycle().current_state(), &AccessState::AwaitingPin);
    }

    #[tokio::test]
    async fn test_local_log_failure_is_fatal_but_rearms_cycle() {
        let appender = Arc::new(MemoryAppender::failing());
        let mut engine = engine_with(Some(ScriptedVerifier::matching()), appender.clone());

        assert!(engine.decide("1234").await.is_err());
        // A later attempt still runs a full cycle.
        assert_eq!(engine.cycle().current_state(), &AccessState::AwaitingPin);
    }

    #[tokio::test]
    async fn test_one_audit_line_per_decision() {
        let appender = Arc::new(MemoryAppender::new());
        let mut engine = engine_with(
            Some(ScriptedVerifier::with_results([
                MatchResult::acquired(40.0, true),
                MatchResult::acquired(80.0, false),
            ])),
            appender.clone(),
        );

        engine.decide("1234").await.unwrap();
        engine.decide("9999").await.unwrap();
        engine.decide("1234").await.unwrap();

        let lines = appender.lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("\"outcome\":\"granted\""));
        assert!(lines[1].contains("\"reason\":\"unknown_pin\""));
        assert!(lines[2].contains("\"reason\":\"face_mismatch\""));
    }
}

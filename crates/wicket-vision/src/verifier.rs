//! Fail-closed face verification.

#![allow(async_fn_in_trait)]

use std::time::Duration;

use tracing::{debug, info, warn};

use wicket_core::{ControllerConfig, MatchReason, MatchResult, ScoreDirection, UserRecord};
use wicket_hardware::{FaceDetector, FaceMatcher, LiveCapture, RawImage, ReferenceLoader};

/// One identity verification against a user's stored reference.
///
/// The seam between the decision engine and the vision stack. The
/// engine only ever sees a [`MatchResult`]; verification cannot error
/// or panic its way past a deny.
pub trait VerifyIdentity {
    /// Verify a live face against the user's enrolled reference.
    async fn verify(&mut self, user: &UserRecord) -> MatchResult;
}

/// Orchestrates one identity verification against a stored reference.
///
/// The verifier owns the live sample for the duration of one `verify`
/// call and discards it with the call; no sample is persisted. Every
/// fault in the acquisition or matching path is converted into a
/// [`MatchResult`] failure reason — `verify` is infallible from the
/// caller's perspective, and a failed verification can only ever deny.
pub struct FaceVerifier<R, C, D, M> {
    reference_loader: R,
    camera: C,
    detector: D,
    matcher: M,
    threshold: f32,
    direction: ScoreDirection,
    capture_attempts: u32,
    capture_timeout: Duration,
}

impl<R, C, D, M> FaceVerifier<R, C, D, M>
where
    R: ReferenceLoader,
    C: LiveCapture,
    D: FaceDetector,
    M: FaceMatcher,
{
    /// Create a verifier from controller configuration and the supplied
    /// vision capabilities.
    pub fn new(config: &ControllerConfig, reference_loader: R, camera: C, detector: D, matcher: M) -> Self {
        Self {
            reference_loader,
            camera,
            detector,
            matcher,
            threshold: config.match_threshold,
            direction: config.score_direction,
            capture_attempts: config.capture_attempts.max(1),
            capture_timeout: config.capture_timeout(),
        }
    }

    /// Acquire one live frame within the attempt and time budgets.
    async fn acquire_live(&mut self) -> Option<RawImage> {
        let attempts = self.capture_attempts;
        let camera = &mut self.camera;

        let acquisition = async {
            for attempt in 1..=attempts {
                match camera.capture_frame().await {
                    Ok(frame) => return Some(frame),
                    Err(e) => {
                        warn!(attempt, attempts, error = %e, "live capture attempt failed");
                    }
                }
            }
            None
        };

        match tokio::time::timeout(self.capture_timeout, acquisition).await {
            Ok(frame) => frame,
            Err(_) => {
                warn!(
                    budget_ms = self.capture_timeout.as_millis() as u64,
                    "live capture budget exhausted"
                );
                None
            }
        }
    }
}

impl<R, C, D, M> VerifyIdentity for FaceVerifier<R, C, D, M>
where
    R: ReferenceLoader,
    C: LiveCapture,
    D: FaceDetector,
    M: FaceMatcher,
{
    /// Steps: resolve the enrolled reference region, acquire a live
    /// frame (bounded attempts within a wall-clock budget), detect a
    /// face in it, score the pair, and compare the score against the
    /// threshold in the configured direction. Each step's failure maps
    /// to its [`MatchReason`]; none of them propagate as errors.
    async fn verify(&mut self, user: &UserRecord) -> MatchResult {
        let reference = match self.reference_loader.load_reference(&user.reference_image).await {
            Ok(region) => region,
            Err(e) => {
                warn!(user = %user.id, error = %e, "reference face unavailable");
                return MatchResult::failed(MatchReason::NoReferenceFace);
            }
        };

        let Some(frame) = self.acquire_live().await else {
            return MatchResult::failed(MatchReason::MatcherError);
        };

        let Some(live) = self.detector.detect(&frame) else {
            info!(user = %user.id, "no face detected in live sample");
            return MatchResult::failed(MatchReason::NoFaceDetected);
        };

        let score = match self.matcher.compare(&reference, &live) {
            Ok(score) => score,
            Err(e) => {
                warn!(user = %user.id, error = %e, "matcher fault");
                return MatchResult::failed(MatchReason::MatcherError);
            }
        };

        let matched = self.direction.accepts(score, self.threshold);
        debug!(
            user = %user.id,
            score,
            threshold = self.threshold,
            matched,
            "similarity scored"
        );
        MatchResult::acquired(score, matched)
    }
}

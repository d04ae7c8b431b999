//! Mock vision backend: detector, matcher, and reference loader.

use crate::error::{HardwareError, Result};
use crate::traits::{FaceDetector, FaceMatcher, ReferenceLoader};
use crate::types::{FaceRegion, RawImage, Rect};
use std::collections::HashMap;
use std::sync::Mutex;
use wicket_core::ImageHandle;

/// Build a small synthetic face region for tests.
fn synthetic_region(seed: u8) -> FaceRegion {
    FaceRegion::new(
        vec![seed; 16],
        Rect {
            x: 0,
            y: 0,
            width: 4,
            height: 4,
        },
    )
}

/// Detector that either always finds a face or never does.
#[derive(Debug, Clone, Copy)]
pub struct MockDetector {
    detects: bool,
}

impl MockDetector {
    /// Detector that finds a face in every frame.
    #[must_use]
    pub fn always() -> Self {
        Self { detects: true }
    }

    /// Detector that never finds a face.
    #[must_use]
    pub fn never() -> Self {
        Self { detects: false }
    }
}

impl FaceDetector for MockDetector {
    fn detect(&self, image: &RawImage) -> Option<FaceRegion> {
        if !self.detects {
            return None;
        }
        let seed = image.pixels.first().copied().unwrap_or(0);
        Some(synthetic_region(seed))
    }
}

/// Matcher that replays scripted scores.
///
/// Scores are consumed per call; the last score repeats once the script
/// is exhausted. An empty script means the matcher faults.
#[derive(Debug)]
pub struct MockMatcher {
    scores: Mutex<Vec<f32>>,
    faulty: bool,
    calls: Mutex<u32>,
}

impl MockMatcher {
    /// Matcher that always produces the given score.
    #[must_use]
    pub fn with_score(score: f32) -> Self {
        Self::with_scores(vec![score])
    }

    /// Matcher that replays the given scores in order, repeating the
    /// last one.
    #[must_use]
    pub fn with_scores(scores: Vec<f32>) -> Self {
        Self {
            scores: Mutex::new(scores),
            faulty: false,
            calls: Mutex::new(0),
        }
    }

    /// Matcher whose every comparison fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            scores: Mutex::new(Vec::new()),
            faulty: true,
            calls: Mutex::new(0),
        }
    }

    /// Number of comparisons performed so far.
    #[must_use]
    pub fn call_count(&self) -> u32 {
        *self
            .calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FaceMatcher for MockMatcher {
    fn compare(&self, _reference: &FaceRegion, _live: &FaceRegion) -> Result<f32> {
        *self
            .calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) += 1;
        if self.faulty {
            return Err(HardwareError::matcher_fault("mock matcher fault"));
        }
        let mut scores = self
            .scores
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if scores.len() > 1 {
            Ok(scores.remove(0))
        } else {
            scores
                .first()
                .copied()
                .ok_or_else(|| HardwareError::matcher_fault("mock matcher has no scores"))
        }
    }
}

/// Reference loader backed by an in-memory handle map.
///
/// Handles absent from the map fail as unusable references, matching a
/// stored enrollment image with no detectable face.
#[derive(Debug, Default)]
pub struct MockReferenceLoader {
    regions: HashMap<String, FaceRegion>,
}

impl MockReferenceLoader {
    /// Create an empty loader; every lookup fails.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a synthetic enrolled face for a handle.
    pub fn enroll(&mut self, handle: &ImageHandle) -> &mut Self {
        self.regions
            .insert(handle.as_str().to_string(), synthetic_region(7));
        self
    }

    /// Register a specific region for a handle.
    pub fn enroll_region(&mut self, handle: &ImageHandle, region: FaceRegion) -> &mut Self {
        self.regions.insert(handle.as_str().to_string(), region);
        self
    }
}

impl ReferenceLoader for MockReferenceLoader {
    async fn load_reference(&self, handle: &ImageHandle) -> Result<FaceRegion> {
        self.regions.get(handle.as_str()).cloned().ok_or_else(|| {
            HardwareError::reference_unusable(format!("no enrolled face for {}", handle.as_str()))
        })
    }
}

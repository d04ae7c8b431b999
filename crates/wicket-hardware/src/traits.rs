//! Capability trait definitions.
//!
//! These traits are the narrow contracts between the decision pipeline
//! and its external collaborators. The pipeline only ever sees these
//! interfaces; GPIO wiring, camera drivers, and vision backends stay on
//! the other side.
//!
//! Async methods use native `async fn` in traits (Edition 2024 RPITIT),
//! so no `async_trait` macro is needed. The traits are consequently not
//! object-safe; consumers take them as generic type parameters.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::{FaceRegion, RawImage, ScanSample};
use wicket_core::ImageHandle;

/// Poll-based reader of the keypad matrix lines.
///
/// One call returns one snapshot of the matrix taken at the caller's
/// polling cadence. Implementations drive rows and read columns (or
/// vice versa) internally.
pub trait LineSource: Send {
    /// Take one sample of the matrix line states.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying lines cannot be read. This is
    /// a hard fault: the scanner halts rather than synthesize keys.
    fn sample(&mut self) -> Result<ScanSample>;
}

/// Live camera frame acquisition.
///
/// # Examples
///
/// ```no_run
/// use wicket_hardware::traits::LiveCapture;
/// use wicket_hardware::error::Result;
///
/// async fn grab_one<C: LiveCapture>(camera: &mut C) -> Result<u32> {
///     let frame = camera.capture_frame().await?;
///     Ok(frame.width)
/// }
/// ```
pub trait LiveCapture: Send {
    /// Capture one frame.
    ///
    /// This method blocks asynchronously until a frame is available or
    /// the device reports a fault. Callers bound the wait with their own
    /// timeout; implementations need not enforce one.
    ///
    /// # Errors
    ///
    /// Returns an error if the camera is unavailable or the frame could
    /// not be read.
    async fn capture_frame(&mut self) -> Result<RawImage>;
}

/// Face-region detection over a captured frame.
pub trait FaceDetector: Send + Sync {
    /// Find the most prominent face in the image, if any.
    fn detect(&self, image: &RawImage) -> Option<FaceRegion>;
}

/// Similarity scoring between two face regions.
pub trait FaceMatcher: Send + Sync {
    /// Score the live region against the reference region.
    ///
    /// Interpretation of the score (distance vs similarity) is
    /// backend-specific; deployments declare the comparison direction in
    /// configuration rather than assuming one here.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot produce a score.
    fn compare(&self, reference: &FaceRegion, live: &FaceRegion) -> Result<f32>;
}

/// Resolver from a stored image handle to its enrolled face region.
pub trait ReferenceLoader: Send + Sync {
    /// Load and detect the enrolled face for a reference image.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be resolved or contains no
    /// detectable face.
    async fn load_reference(&self, handle: &ImageHandle) -> Result<FaceRegion>;
}

//! Controller configuration.
//!
//! One immutable [`ControllerConfig`] value is constructed at startup
//! (from defaults, a builder, or a deserialized config file) and passed
//! by reference into each component. There are no ambient globals.

use crate::constants::{
    DEFAULT_AUDIT_LOG_PATH, DEFAULT_CAPTURE_ATTEMPTS, DEFAULT_CAPTURE_TIMEOUT_MS,
    DEFAULT_DEBOUNCE_SAMPLES, DEFAULT_MATCH_THRESHOLD, DEFAULT_PIN_IDLE_TIMEOUT_MS,
    DEFAULT_PIN_LENGTH, DEFAULT_POLL_INTERVAL_MS, DEFAULT_PUBLISH_TIMEOUT_MS,
};
use crate::error::{Error, Result};
use crate::types::{ReservedKey, ScoreDirection};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Immutable access-controller configuration.
///
/// # Examples
///
/// ```
/// use wicket_core::ControllerConfig;
///
/// let config = ControllerConfig::builder()
///     .pin_length(6)
///     .face_verification(false)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.pin_length, 6);
/// assert!(!config.face_verification);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerConfig {
    /// Required PIN length in digits.
    #[serde(default = "default_pin_length")]
    pub pin_length: usize,

    /// Idle milliseconds before a partial PIN entry is discarded.
    #[serde(default = "default_pin_idle_timeout_ms")]
    pub pin_idle_timeout_ms: u64,

    /// Matrix scan polling interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Consecutive active samples required to confirm a key press.
    #[serde(default = "default_debounce_samples")]
    pub debounce_samples: u32,

    /// Whether a PIN hit also requires face verification.
    #[serde(default = "default_face_verification")]
    pub face_verification: bool,

    /// Matcher decision threshold.
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f32,

    /// Which way scores compare against the threshold.
    #[serde(default = "default_score_direction")]
    pub score_direction: ScoreDirection,

    /// Live-capture attempts before the verifier gives up.
    #[serde(default = "default_capture_attempts")]
    pub capture_attempts: u32,

    /// Wall-clock budget for acquiring one live sample, in milliseconds.
    #[serde(default = "default_capture_timeout_ms")]
    pub capture_timeout_ms: u64,

    /// If set, a submit on a short buffer is denied as malformed
    /// instead of ignored.
    #[serde(default)]
    pub submit_short_pin_rejects: bool,

    /// Reserved key bound to the cancel action, if any.
    #[serde(default)]
    pub cancel_key: Option<ReservedKey>,

    /// Path of the local append-only decision log.
    #[serde(default = "default_audit_log_path")]
    pub audit_log_path: PathBuf,

    /// Budget for one best-effort remote publish, in milliseconds.
    #[serde(default = "default_publish_timeout_ms")]
    pub publish_timeout_ms: u64,
}

fn default_pin_length() -> usize {
    DEFAULT_PIN_LENGTH
}
fn default_pin_idle_timeout_ms() -> u64 {
    DEFAULT_PIN_IDLE_TIMEOUT_MS
}
fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}
fn default_debounce_samples() -> u32 {
    DEFAULT_DEBOUNCE_SAMPLES
}
fn default_face_verification() -> bool {
    true
}
fn default_match_threshold() -> f32 {
    DEFAULT_MATCH_THRESHOLD
}
fn default_score_direction() -> ScoreDirection {
    ScoreDirection::LowerIsCloser
}
fn default_capture_attempts() -> u32 {
    DEFAULT_CAPTURE_ATTEMPTS
}
fn default_capture_timeout_ms() -> u64 {
    DEFAULT_CAPTURE_TIMEOUT_MS
}
fn default_audit_log_path() -> PathBuf {
    PathBuf::from(DEFAULT_AUDIT_LOG_PATH)
}
fn default_publish_timeout_ms() -> u64 {
    DEFAULT_PUBLISH_TIMEOUT_MS
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            pin_length: default_pin_length(),
            pin_idle_timeout_ms: default_pin_idle_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            debounce_samples: default_debounce_samples(),
            face_verification: default_face_verification(),
            match_threshold: default_match_threshold(),
            score_direction: default_score_direction(),
            capture_attempts: default_capture_attempts(),
            capture_timeout_ms: default_capture_timeout_ms(),
            submit_short_pin_rejects: false,
            cancel_key: None,
            audit_log_path: default_audit_log_path(),
            publish_timeout_ms: default_publish_timeout_ms(),
        }
    }
}

impl ControllerConfig {
    /// Create a builder pre-populated with defaults.
    pub fn builder() -> ControllerConfigBuilder {
        ControllerConfigBuilder::default()
    }

    /// Idle timeout as a [`Duration`].
    #[must_use]
    pub fn pin_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.pin_idle_timeout_ms)
    }

    /// Scan polling interval as a [`Duration`].
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Live-capture budget as a [`Duration`].
    #[must_use]
    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }

    /// Remote publish budget as a [`Duration`].
    #[must_use]
    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }

    /// Validate field ranges.
    ///
    /// # Errors
    /// Returns `Error::Config` describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if !(1..=16).contains(&self.pin_length) {
            return Err(Error::Config(format!(
                "pin_length must be 1-16, got {}",
                self.pin_length
            )));
        }
        if self.debounce_samples == 0 {
            return Err(Error::Config("debounce_samples must be at least 1".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be nonzero".into()));
        }
        if self.capture_attempts == 0 {
            return Err(Error::Config("capture_attempts must be at least 1".into()));
        }
        if !self.match_threshold.is_finite() {
            return Err(Error::Config("match_threshold must be finite".into()));
        }
        Ok(())
    }
}

/// Builder for [`ControllerConfig`].
#[derive(Debug, Default, Clone)]
pub struct ControllerConfigBuilder {
    config: Option<ControllerConfig>,
}

impl ControllerConfigBuilder {
    fn config(&mut self) -> &mut ControllerConfig {
        self.config.get_or_insert_with(ControllerConfig::default)
    }

    /// Set the required PIN length.
    pub fn pin_length(mut self, len: usize) -> Self {
        self.config().pin_length = len;
        self
    }

    /// Set the partial-entry idle timeout in milliseconds.
    pub fn pin_idle_timeout_ms(mut self, ms: u64) -> Self {
        self.config().pin_idle_timeout_ms = ms;
        self
    }

    /// Set the scan polling interval in milliseconds.
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config().poll_interval_ms = ms;
        self
    }

    /// Set the debounce sample count.
    pub fn debounce_samples(mut self, samples: u32) -> Self {
        self.config().debounce_samples = samples;
        self
    }

    /// Enable or disable face verification (PIN-only mode when off).
    pub fn face_verification(mut self, enabled: bool) -> Self {
        self.config().face_verification = enabled;
        self
    }

    /// Set the matcher threshold and its comparison direction together.
    ///
    /// The two are only meaningful as a pair, so they are set as one.
    pub fn match_threshold(mut self, threshold: f32, direction: ScoreDirection) -> Self {
        self.config().match_threshold = threshold;
        self.config().score_direction = direction;
        self
    }

    /// Set the live-capture attempt budget.
    pub fn capture_attempts(mut self, attempts: u32) -> Self {
        self.config().capture_attempts = attempts;
        self
    }

    /// Set the live-capture wall-clock budget in milliseconds.
    pub fn capture_timeout_ms(mut self, ms: u64) -> Self {
        self.config().capture_timeout_ms = ms;
        self
    }

    /// Treat submit on a short buffer as an explicit malformed entry.
    pub fn submit_short_pin_rejects(mut self, rejects: bool) -> Self {
        self.config().submit_short_pin_rejects = rejects;
        self
    }

    /// Bind a reserved key to the cancel action.
    pub fn cancel_key(mut self, key: ReservedKey) -> Self {
        self.config().cancel_key = Some(key);
        self
    }

    /// Set the local audit log path.
    pub fn audit_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config().audit_log_path = path.into();
        self
    }

    /// Set the remote publish budget in milliseconds.
    pub fn publish_timeout_ms(mut self, ms: u64) -> Self {
        self.config().publish_timeout_ms = ms;
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    /// Returns `Error::Config` if any field is out of range.
    pub fn build(mut self) -> Result<ControllerConfig> {
        let config = self.config().clone();
        config.validate()?;
        Ok(config)
    }
}

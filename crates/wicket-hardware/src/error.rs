//! Error types for hardware operations.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Operation timed out after specified duration.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// The keypad line source could not be read.
    #[error("Line source fault: {message}")]
    LineFault { message: String },

    /// Frame capture failed.
    #[error("Capture failed: {message}")]
    CaptureFailed { message: String },

    /// A reference image could not be resolved to a face region.
    #[error("Reference image unusable: {message}")]
    ReferenceUnusable { message: String },

    /// The matcher backend failed to produce a score.
    #[error("Matcher fault: {message}")]
    MatcherFault { message: String },

    /// Invalid data received from a device.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a new line fault error.
    pub fn line_fault(message: impl Into<String>) -> Self {
        Self::LineFault {
            message: message.into(),
        }
    }

    /// Create a new capture failure error.
    pub fn capture_failed(message: impl Into<String>) -> Self {
        Self::CaptureFailed {
            message: message.into(),
        }
    }

    /// Create a new unusable-reference error.
    pub fn reference_unusable(message: impl Into<String>) -> Self {
        Self::ReferenceUnusable {
            message: message.into(),
        }
    }

    /// Create a new matcher fault error.
    pub fn matcher_fault(message: impl Into<String>) -> Self {
        Self::MatcherFault {
            message: message.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }
}

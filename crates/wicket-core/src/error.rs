use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Input path errors
    #[error("Line source fault: {0}")]
    InputFault(String),

    #[error("Malformed PIN: expected {expected} digits, got {actual}")]
    MalformedPin { expected: usize, actual: usize },

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(char),

    // Directory errors
    #[error("Duplicate PIN in directory update: {0}")]
    DuplicatePin(String),

    #[error("Directory sync failed: {0}")]
    SyncFailed(String),

    // State machine errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // Audit errors
    #[error("Audit log write failed: {0}")]
    AuditWrite(String),

    #[error("Record serialization failed: {0}")]
    Serialization(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

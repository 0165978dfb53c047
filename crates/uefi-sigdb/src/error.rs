//! Error types for the signature database.
//!
//! All errors are strongly typed and propagated without panicking.
//! Errors raised while restoring a single record are logged and skipped by
//! the store rather than returned.

/// Signature database error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum SigDbError {
    #[error("Signature already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage write failed: {0}")]
    StorageWrite(String),

    #[error("Storage read failed: {0}")]
    StorageRead(String),

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    #[error("Internal failure: {0}")]
    InternalFailure(String),

    #[error("Invalid GUID: {0}")]
    InvalidGuid(String),

    #[error("Unknown signature format: {0}")]
    UnknownFormat(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, SigDbError>;

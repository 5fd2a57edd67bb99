//! Error types for account store operations

/// Errors from loading or persisting the account file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("account file parse error: {0}")]
    Parse(String),

    #[error("duplicate account label: {0}")]
    DuplicateLabel(String),
}

/// Result alias for account store operations.
pub type Result<T> = std::result::Result<T, Error>;

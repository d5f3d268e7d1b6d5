use thiserror::Error;

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("Failed to read PDF: {0}")]
    DocumentUnreadable(String),

    #[error("Invalid page range: {0}")]
    InvalidRange(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),

    #[error("Archive error: {0}")]
    ArchiveError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

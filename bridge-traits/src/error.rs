use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Media source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Decoding failed: {0}")]
    Decode(String),

    #[error("Audio session configuration failed: {0}")]
    AudioSession(String),

    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

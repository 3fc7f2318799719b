use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpliceError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Failed to parse PDF: {0}")]
    Codec(String),

    #[error("PDF operation failed: {0}")]
    Assembly(String),

    #[error("Failed to store output: {0}")]
    Persistence(String),
}

impl SpliceError {
    /// Whether the caller is at fault (bad request) rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, SpliceError::InvalidPayload(_))
    }
}

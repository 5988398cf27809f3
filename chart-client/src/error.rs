use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    /// Malformed index document. The cause stays attached for logging but is
    /// never part of the message.
    #[error("Invalid data")]
    InvalidData(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// Upstream answered with a non-success status.
    #[error("{0}")]
    Upstream(String),
    #[error("HTTP Error")]
    HTTPError(#[from] reqwest::Error),
}

impl LookupError {
    pub(crate) fn invalid_data(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        LookupError::InvalidData(err.into())
    }
}

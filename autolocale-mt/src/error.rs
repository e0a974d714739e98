use thiserror::Error;

/// Error types for the translation gateway
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MtError {
    /// Missing or unusable credential/endpoint configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// The vendor answered with a non-success HTTP status
    #[error("Upstream error ({status}): {message}")]
    UpstreamError { status: u16, message: String },
    /// The vendor answered successfully but returned zero translations
    #[error("No translation returned from the translation API")]
    EmptyResponse,
    /// The vendor returned a different number of translations than requested
    #[error("Expected {expected} translations, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
    /// Transport-level failure (connect, timeout, body decoding)
    #[error("Network error: {0}")]
    NetworkError(String),
    /// Locale code rejected before any request was made
    #[error("Invalid locale: {0}")]
    InvalidLocale(String),
    /// Any other translation failure
    #[error("Translation error: {0}")]
    TranslationError(String),
}

impl MtError {
    /// Whether the error came from the vendor violating its response contract
    /// or refusing the call, as opposed to local misconfiguration.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            MtError::UpstreamError { .. }
                | MtError::EmptyResponse
                | MtError::CountMismatch { .. }
                | MtError::NetworkError(_)
        )
    }
}

impl From<reqwest::Error> for MtError {
    fn from(error: reqwest::Error) -> Self {
        MtError::NetworkError(error.to_string())
    }
}

/// Result type for MT operations
pub type MtResult<T> = Result<T, MtError>;

use autolocale_mt::MtError;
use thiserror::Error;

/// Failures reported by a [`DocumentStore`](crate::storage::DocumentStore)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Document {id} not found in {collection} ({locale})")]
    NotFound {
        collection: String,
        id: String,
        locale: String,
    },
    #[error("Document {id} already exists in {collection} ({locale})")]
    Conflict {
        collection: String,
        id: String,
        locale: String,
    },
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by translation passes and their setup
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("Translation gateway error: {0}")]
    Mt(#[from] MtError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Document {id} not found in collection {collection}")]
    NotFound { collection: String, id: String },

    #[error("No documents found in collection {collection} ({locale})")]
    NoDocuments { collection: String, locale: String },

    #[error("Collection not configured for translation: {0}")]
    CollectionNotConfigured(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TranslateError>;

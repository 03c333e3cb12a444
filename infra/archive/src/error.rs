use thiserror::Error;

/// A specialized error enum for snapshot access failures.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Required builder parameters were missing or inconsistent.
    #[error("Archive validation error: {0}")]
    Validation(String),

    /// The snapshot engine could not be reached or never became healthy.
    #[error("Archive connection error: {0}")]
    Connection(String),

    /// A stored record could not be interpreted as a capture.
    #[error("Malformed capture record for {url}")]
    MalformedRecord { url: String },

    /// Any error surfaced by the underlying engine.
    #[error(transparent)]
    Db(#[from] surrealdb::Error),
}

use thiserror::Error;

/// Failure classes surfaced by the record store adapter. Keeping a malformed
/// id distinct from a backend failure lets the UI phrase the message
/// correctly: the former is a caller bug, the latter a server problem.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The initial connection never succeeded, so there is no handle to call.
    /// Reported before any driver call is attempted.
    #[error("not connected to MongoDB: {0}")]
    Disconnected(String),
    /// The id string is not a well-formed ObjectId. Raised before the store
    /// is contacted, never conflated with a "not found" outcome.
    #[error("malformed record id {0:?}")]
    InvalidId(String),
    /// The operation reached the store but failed there (timeout, lost
    /// connection mid-operation, server error).
    #[error("MongoDB operation failed: {0}")]
    Backend(#[from] mongodb::error::Error),
}

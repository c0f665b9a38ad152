use thiserror::Error;

/// Engine failure taxonomy.
///
/// `DuplicateVote` is surfaced to callers and never retried. Storage
/// failures abort the current placement type's rotation only; the pass
/// continues with the remaining types.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("business {0} not found")]
    BusinessNotFound(i64),
    #[error("user {user_id} has already voted for {month}")]
    DuplicateVote { user_id: i64, month: String },
    #[error(transparent)]
    Invalid(#[from] vitrine_core::CoreError),
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl EngineError {
    /// Wrap a backend error from a store implementation.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        EngineError::Storage(Box::new(err))
    }
}

//! Pipeline error type.

use examsweep_storage::StorageError;

/// Errors raised by sweep orchestration, the fix phase and the review
/// queue.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Storage failure underneath an orchestration step
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A referenced run/result/item does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// A review action hit a result outside PENDING_REVIEW
    #[error("invalid state: {0}")]
    InvalidState(String),
}

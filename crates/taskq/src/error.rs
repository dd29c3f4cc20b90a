//! Error types for task queue operations.

use thiserror::Error;

/// Errors that can occur during task queue operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Item is already live in the queue.
    #[error("duplicate item: value is already queued")]
    DuplicateItem,

    /// Item is not live in the queue.
    #[error("item not found in queue")]
    NotFound,

    /// Queue is at capacity and the full-queue policy refused the push.
    #[error("queue overflow: maximum size of {max_size} reached")]
    QueueOverflow { max_size: usize },

    /// Pop arguments are inconsistent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type alias for task queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;

use thiserror::Error;

/// Errors returned by front access on a [`FifoQueue`](super::FifoQueue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The queue held no elements when the operation ran. Callers can poll again
    /// later; nothing was modified.
    #[error("queue empty")]
    Empty,
}

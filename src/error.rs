//! Access Error Types
//!
//! Every failure the dispatcher can report to the host, as explicit values.
//! Nothing is printed-and-swallowed; asynchronous failures surface through
//! the change notifier as failure result codes instead.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("Resource not found: {0}")]
    NotFound(u16),

    #[error("Resource {0} is not readable")]
    NotReadable(u16),

    #[error("Resource {0} is not writable")]
    NotWritable(u16),

    #[error("Resource {0} is not executable")]
    NotExecutable(u16),

    #[error("Operation {operation} not legal in phase {phase}")]
    InvalidState {
        phase: &'static str,
        operation: &'static str,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Scheduling failure: {0}")]
    Scheduling(String),
}

pub type Result<T> = std::result::Result<T, AccessError>;

//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::SummaryError;
use storage::repository::StorageError;

/// Errors emitted by quiz sessions and the quiz workflow.
///
/// The state variants (`NotStarted`, `Completed`, `NotComplete`,
/// `IndexMismatch`) signal an operation invoked out of sequence; they fail
/// the call, never the session. `Storage` carries persistence failures —
/// recoverable, with all in-memory state intact.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,

    #[error("session has not been started")]
    NotStarted,

    #[error("session already completed")]
    Completed,

    #[error("session is not complete")]
    NotComplete,

    #[error("answer submitted for question {submitted}, current question is {current}")]
    IndexMismatch { submitted: usize, current: usize },

    #[error(transparent)]
    Summary(#[from] SummaryError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{QuizError, QuizId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by session services.
///
/// Every rejection leaves the session state exactly as it was.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("quiz {0} not found")]
    QuizNotFound(QuizId),
    #[error("option {index} is out of range for a question with {options} options")]
    InvalidOption { index: usize, options: usize },
    #[error("timer fired for question {fired} while question {current} is active")]
    StaleQuestion { fired: usize, current: usize },
    #[error("answer already revealed")]
    AlreadyRevealed,
    #[error("answer not revealed yet")]
    NotRevealed,
    #[error("session already completed")]
    Completed,
    #[error("session is still in progress")]
    InProgress,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AnalyticsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalyticsError {
    #[error("quiz {0} not found")]
    QuizNotFound(QuizId),
    #[error("no attempts recorded for quiz {0}")]
    NoAttemptData(QuizId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

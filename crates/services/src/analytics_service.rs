use std::sync::Arc;

use tracing::debug;

use quiz_core::analytics::QuizAnalytics;
use quiz_core::model::QuizId;
use storage::repository::{AttemptRepository, QuizRepository, StorageError};

use crate::error::AnalyticsError;

/// Computes quiz statistics on demand from stored attempts.
///
/// Nothing is cached; each call reads the current attempts.
#[derive(Clone)]
pub struct AnalyticsService {
    quizzes: Arc<dyn QuizRepository>,
    attempts: Arc<dyn AttemptRepository>,
}

impl AnalyticsService {
    #[must_use]
    pub fn new(quizzes: Arc<dyn QuizRepository>, attempts: Arc<dyn AttemptRepository>) -> Self {
        Self { quizzes, attempts }
    }

    /// Aggregate all attempts recorded for a quiz.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::QuizNotFound` if the quiz does not exist,
    /// `AnalyticsError::NoAttemptData` if nobody has completed it yet, or
    /// `AnalyticsError::Storage` for repository failures.
    pub async fn quiz_analytics(&self, quiz_id: &QuizId) -> Result<QuizAnalytics, AnalyticsError> {
        let quiz = match self.quizzes.get_quiz(quiz_id).await {
            Ok(quiz) => quiz,
            Err(StorageError::NotFound) => return Err(AnalyticsError::QuizNotFound(quiz_id.clone())),
            Err(err) => return Err(err.into()),
        };
        let attempts = self.attempts.list_attempts(quiz_id).await?;
        debug!(quiz_id = %quiz_id, attempts = attempts.len(), "computing analytics");

        QuizAnalytics::compute(&quiz, &attempts)
            .ok_or_else(|| AnalyticsError::NoAttemptData(quiz_id.clone()))
    }
}

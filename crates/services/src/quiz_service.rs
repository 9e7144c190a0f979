use std::sync::Arc;

use tracing::info;

use quiz_core::model::{NewQuiz, Quiz, QuizId};
use storage::repository::{QuizRepository, StorageError};

use crate::error::QuizServiceError;

/// Orchestrates quiz creation and lookup.
#[derive(Clone)]
pub struct QuizService {
    quizzes: Arc<dyn QuizRepository>,
}

impl QuizService {
    #[must_use]
    pub fn new(quizzes: Arc<dyn QuizRepository>) -> Self {
        Self { quizzes }
    }

    /// Validate a draft, give it a fresh id and persist it.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Quiz` for validation failures.
    /// Returns `QuizServiceError::Storage` if persistence fails.
    pub async fn create_quiz(&self, draft: NewQuiz) -> Result<QuizId, QuizServiceError> {
        let quiz = draft.validate(QuizId::generate())?;
        let quiz_id = self.quizzes.create_quiz(&quiz).await?;
        info!(quiz_id = %quiz_id, questions = quiz.question_count(), "quiz created");
        Ok(quiz_id)
    }

    /// Fetch a quiz by id.
    ///
    /// Returns `Ok(None)` when the quiz does not exist.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn get_quiz(&self, quiz_id: &QuizId) -> Result<Option<Quiz>, QuizServiceError> {
        match self.quizzes.get_quiz(quiz_id).await {
            Ok(quiz) => Ok(Some(quiz)),
            Err(StorageError::NotFound) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// List quizzes in creation order.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn list_quizzes(&self) -> Result<Vec<Quiz>, QuizServiceError> {
        let quizzes = self.quizzes.list_quizzes().await?;
        Ok(quizzes)
    }
}

use async_trait::async_trait;
use quiz_core::model::{Quiz, QuizAttempt, QuizId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for quizzes.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Persist a new quiz.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a quiz with the same id exists, or
    /// other storage errors.
    async fn create_quiz(&self, quiz: &Quiz) -> Result<QuizId, StorageError>;

    /// Fetch a quiz by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_quiz(&self, id: &QuizId) -> Result<Quiz, StorageError>;

    /// List all quizzes in creation order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the quizzes cannot be loaded.
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, StorageError>;
}

/// Append-only store of completed attempts.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Record a completed attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the attempt id was already recorded,
    /// or other storage errors.
    async fn append_attempt(&self, attempt: &QuizAttempt) -> Result<(), StorageError>;

    /// Attempts recorded for a quiz, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempts cannot be loaded.
    async fn list_attempts(&self, quiz_id: &QuizId) -> Result<Vec<QuizAttempt>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    quizzes: Arc<Mutex<Vec<Quiz>>>,
    attempts: Arc<Mutex<HashMap<QuizId, Vec<QuizAttempt>>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of attempts across all quizzes.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn attempt_count(&self) -> Result<usize, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.values().map(Vec::len).sum())
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn create_quiz(&self, quiz: &Quiz) -> Result<QuizId, StorageError> {
        let mut guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.iter().any(|q| q.id() == quiz.id()) {
            return Err(StorageError::Conflict);
        }
        guard.push(quiz.clone());
        Ok(quiz.id().clone())
    }

    async fn get_quiz(&self, id: &QuizId) -> Result<Quiz, StorageError> {
        let guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|q| q.id() == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_quizzes(&self) -> Result<Vec<Quiz>, StorageError> {
        let guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn append_attempt(&self, attempt: &QuizAttempt) -> Result<(), StorageError> {
        let mut guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let bucket = guard.entry(attempt.quiz_id().clone()).or_default();
        if bucket.iter().any(|a| a.id() == attempt.id()) {
            return Err(StorageError::Conflict);
        }
        bucket.push(attempt.clone());
        Ok(())
    }

    async fn list_attempts(&self, quiz_id: &QuizId) -> Result<Vec<QuizAttempt>, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut attempts = guard.get(quiz_id).cloned().unwrap_or_default();
        attempts.sort_by_key(QuizAttempt::date);
        Ok(attempts)
    }
}

/// Aggregates quiz and attempt repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub quizzes: Arc<dyn QuizRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let quizzes: Arc<dyn QuizRepository> = Arc::new(repo.clone());
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo);
        Self { quizzes, attempts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples;
    use quiz_core::time::fixed_now;

    #[tokio::test]
    async fn quiz_round_trips_and_rejects_duplicates() {
        let repo = InMemoryRepository::new();
        let quiz = samples::general_knowledge_quiz();

        let id = repo.create_quiz(&quiz).await.unwrap();
        assert_eq!(repo.get_quiz(&id).await.unwrap(), quiz);
        assert!(matches!(
            repo.create_quiz(&quiz).await.unwrap_err(),
            StorageError::Conflict
        ));
        assert_eq!(repo.list_quizzes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_quiz_is_not_found() {
        let repo = InMemoryRepository::new();
        let err = repo.get_quiz(&QuizId::new("nope")).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn attempts_are_listed_per_quiz_oldest_first() {
        let repo = InMemoryRepository::new();
        let quiz_id = QuizId::new(samples::GENERAL_KNOWLEDGE_ID);
        let later = QuizAttempt::new(
            quiz_id.clone(),
            fixed_now() + chrono::Duration::minutes(5),
            1,
            3,
            vec![Some(0), Some(1), Some(0)],
            30,
        );
        let earlier = QuizAttempt::new(
            quiz_id.clone(),
            fixed_now(),
            3,
            3,
            vec![Some(2), Some(1), Some(1)],
            20,
        );
        let elsewhere = QuizAttempt::new(QuizId::new("other"), fixed_now(), 0, 1, vec![None], 5);

        repo.append_attempt(&later).await.unwrap();
        repo.append_attempt(&earlier).await.unwrap();
        repo.append_attempt(&elsewhere).await.unwrap();

        let listed = repo.list_attempts(&quiz_id).await.unwrap();
        assert_eq!(listed, vec![earlier, later]);
        assert_eq!(repo.attempt_count().unwrap(), 3);
    }
}

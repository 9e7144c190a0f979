use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{AttemptId, QuizId};

/// Immutable record of one completed pass through a quiz.
///
/// `answers[p]` is the option chosen for the question at position `p`, or
/// `None` when nothing was selected before the reveal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAttempt {
    id: AttemptId,
    quiz_id: QuizId,
    date: DateTime<Utc>,
    score: u32,
    total_questions: u32,
    answers: Vec<Option<usize>>,
    time_spent_secs: u64,
}

impl QuizAttempt {
    /// Record a freshly completed attempt with a new id.
    #[must_use]
    pub fn new(
        quiz_id: QuizId,
        date: DateTime<Utc>,
        score: u32,
        total_questions: u32,
        answers: Vec<Option<usize>>,
        time_spent_secs: u64,
    ) -> Self {
        Self::from_persisted(
            AttemptId::generate(),
            quiz_id,
            date,
            score,
            total_questions,
            answers,
            time_spent_secs,
        )
    }

    /// Rehydrate an attempt from storage.
    #[must_use]
    pub fn from_persisted(
        id: AttemptId,
        quiz_id: QuizId,
        date: DateTime<Utc>,
        score: u32,
        total_questions: u32,
        answers: Vec<Option<usize>>,
        time_spent_secs: u64,
    ) -> Self {
        Self {
            id,
            quiz_id,
            date,
            score,
            total_questions,
            answers,
            time_spent_secs,
        }
    }

    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn quiz_id(&self) -> &QuizId {
        &self.quiz_id
    }

    #[must_use]
    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    /// Answer recorded at `position`; `None` if unanswered or out of range.
    #[must_use]
    pub fn answer(&self, position: usize) -> Option<usize> {
        self.answers.get(position).copied().flatten()
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> u64 {
        self.time_spent_secs
    }
}

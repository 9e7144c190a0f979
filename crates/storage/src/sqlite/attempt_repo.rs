use quiz_core::model::{QuizAttempt, QuizId};

use super::SqliteRepository;
use super::mapping::{conn, map_attempt_row, ser, u64_to_i64};
use crate::repository::{AttemptRepository, StorageError};

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn append_attempt(&self, attempt: &QuizAttempt) -> Result<(), StorageError> {
        let answers = serde_json::to_string(attempt.answers()).map_err(ser)?;

        sqlx::query(
            r"
                INSERT INTO quiz_attempts (
                    id, quiz_id, date, score, total_questions, answers, time_spent_secs
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(attempt.id().to_string())
        .bind(attempt.quiz_id().as_str())
        .bind(attempt.date())
        .bind(i64::from(attempt.score()))
        .bind(i64::from(attempt.total_questions()))
        .bind(answers)
        .bind(u64_to_i64("time_spent_secs", attempt.time_spent_secs())?)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn list_attempts(&self, quiz_id: &QuizId) -> Result<Vec<QuizAttempt>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, quiz_id, date, score, total_questions, answers, time_spent_secs
                FROM quiz_attempts
                WHERE quiz_id = ?1
                ORDER BY date ASC, rowid ASC
            ",
        )
        .bind(quiz_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            out.push(map_attempt_row(row)?);
        }
        Ok(out)
    }
}

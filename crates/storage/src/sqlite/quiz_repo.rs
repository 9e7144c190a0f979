use std::collections::HashMap;

use quiz_core::model::{Quiz, QuizId, QuizQuestion};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, index_to_i64, map_question_row, ser};
use crate::repository::{QuizRepository, StorageError};

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn create_quiz(&self, quiz: &Quiz) -> Result<QuizId, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
                INSERT INTO quizzes (id, title, description)
                VALUES (?1, ?2, ?3)
            ",
        )
        .bind(quiz.id().as_str())
        .bind(quiz.title())
        .bind(quiz.description())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        for (position, question) in quiz.questions().iter().enumerate() {
            let options = serde_json::to_string(question.options()).map_err(ser)?;
            sqlx::query(
                r"
                    INSERT INTO quiz_questions (
                        quiz_id, position, id, question, options, correct_answer
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(quiz.id().as_str())
            .bind(index_to_i64("position", position)?)
            .bind(question.id().as_str())
            .bind(question.question())
            .bind(options)
            .bind(index_to_i64("correct_answer", question.correct_answer())?)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(quiz.id().clone())
    }

    async fn get_quiz(&self, id: &QuizId) -> Result<Quiz, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, title, description
                FROM quizzes
                WHERE id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        let rows = sqlx::query(
            r"
                SELECT id, question, options, correct_answer
                FROM quiz_questions
                WHERE quiz_id = ?1
                ORDER BY position ASC
            ",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut questions = Vec::with_capacity(rows.len());
        for question in &rows {
            questions.push(map_question_row(question)?);
        }

        Ok(Quiz::from_persisted(
            id.clone(),
            row.try_get::<String, _>("title").map_err(ser)?,
            row.try_get::<String, _>("description").map_err(ser)?,
            questions,
        ))
    }

    async fn list_quizzes(&self) -> Result<Vec<Quiz>, StorageError> {
        let quiz_rows = sqlx::query(
            r"
                SELECT id, title, description
                FROM quizzes
                ORDER BY rowid ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let question_rows = sqlx::query(
            r"
                SELECT quiz_id, id, question, options, correct_answer
                FROM quiz_questions
                ORDER BY quiz_id ASC, position ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut by_quiz: HashMap<String, Vec<QuizQuestion>> = HashMap::new();
        for row in &question_rows {
            let quiz_id: String = row.try_get("quiz_id").map_err(ser)?;
            by_quiz
                .entry(quiz_id)
                .or_default()
                .push(map_question_row(row)?);
        }

        let mut out = Vec::with_capacity(quiz_rows.len());
        for row in quiz_rows {
            let id: String = row.try_get("id").map_err(ser)?;
            let questions = by_quiz.remove(&id).unwrap_or_default();
            out.push(Quiz::from_persisted(
                QuizId::new(id),
                row.try_get::<String, _>("title").map_err(ser)?,
                row.try_get::<String, _>("description").map_err(ser)?,
                questions,
            ));
        }
        Ok(out)
    }
}

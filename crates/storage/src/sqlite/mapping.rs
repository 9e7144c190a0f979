use quiz_core::model::{AttemptId, QuestionId, QuizAttempt, QuizId, QuizQuestion};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn(e: sqlx::Error) -> StorageError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => StorageError::Conflict,
        _ => StorageError::Connection(e.to_string()),
    }
}

pub(crate) fn index_to_i64(field: &'static str, v: usize) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn index_from_i64(field: &'static str, v: i64) -> Result<usize, StorageError> {
    usize::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn u64_from_i64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuizQuestion, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let question: String = row.try_get("question").map_err(ser)?;
    let options_json: String = row.try_get("options").map_err(ser)?;
    let options: Vec<String> = serde_json::from_str(&options_json).map_err(ser)?;
    let correct_answer = index_from_i64(
        "correct_answer",
        row.try_get::<i64, _>("correct_answer").map_err(ser)?,
    )?;

    Ok(QuizQuestion::from_persisted(
        QuestionId::new(id),
        question,
        options,
        correct_answer,
    ))
}

pub(crate) fn map_attempt_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuizAttempt, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let id: AttemptId = id.parse().map_err(ser)?;
    let quiz_id: String = row.try_get("quiz_id").map_err(ser)?;
    let date = row.try_get("date").map_err(ser)?;
    let score = u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?;
    let total_questions = u32_from_i64(
        "total_questions",
        row.try_get::<i64, _>("total_questions").map_err(ser)?,
    )?;
    let answers_json: String = row.try_get("answers").map_err(ser)?;
    let answers: Vec<Option<usize>> = serde_json::from_str(&answers_json).map_err(ser)?;
    let time_spent_secs = u64_from_i64(
        "time_spent_secs",
        row.try_get::<i64, _>("time_spent_secs").map_err(ser)?,
    )?;

    Ok(QuizAttempt::from_persisted(
        id,
        QuizId::new(quiz_id),
        date,
        score,
        total_questions,
        answers,
        time_spent_secs,
    ))
}

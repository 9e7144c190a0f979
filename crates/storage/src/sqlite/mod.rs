//! `SQLite` quiz store: quizzes, their ordered questions and completed attempts.

use std::sync::Arc;
use std::time::Duration;

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;
use tracing::debug;

use crate::repository::{AttemptRepository, QuizRepository, Storage};

mod attempt_repo;
mod mapping;
mod migrate;
mod quiz_repo;

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Quiz and attempt repository over one `SQLite` pool.
///
/// A quiz insert writes the quiz row and all question rows in one
/// transaction; attempts are append-only rows keyed by their uuid.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

/// Failure to open or migrate the quiz database.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl SqliteRepository {
    /// Open the quiz database at `database_url`.
    ///
    /// Every pooled connection enforces foreign keys, so question and attempt
    /// rows can never point at a missing quiz.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the database cannot be opened or a
    /// connection pragma is rejected.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        debug!(database_url, "opening quiz database");
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    for pragma in [
                        "PRAGMA foreign_keys = ON;",
                        "PRAGMA journal_mode = WAL;",
                        "PRAGMA busy_timeout = 5000;",
                    ] {
                        sqlx::query(pragma).execute(&mut *conn).await?;
                    }
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Bring the quiz tables up to the latest schema version.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if a migration step fails.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

impl Storage {
    /// Quiz and attempt repositories sharing one migrated `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the database cannot be opened or migrated.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        let quizzes: Arc<dyn QuizRepository> = Arc::new(repo.clone());
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo);
        Ok(Self { quizzes, attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples;

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqliteRepository>();
    }

    #[tokio::test]
    async fn reopening_keeps_stored_quizzes() {
        let url = "sqlite:file:sqlite_mod_reopen?mode=memory&cache=shared";
        let first = SqliteRepository::connect(url).await.unwrap();
        first.migrate().await.unwrap();
        first
            .create_quiz(&samples::general_knowledge_quiz())
            .await
            .unwrap();

        // Migrating an up-to-date schema is a no-op.
        let storage = Storage::sqlite(url).await.unwrap();
        let quizzes = storage.quizzes.list_quizzes().await.unwrap();
        assert_eq!(quizzes.len(), 1);
        assert_eq!(quizzes[0].question_count(), 3);
        drop(first);
    }
}

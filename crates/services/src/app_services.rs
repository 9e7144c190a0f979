use std::sync::Arc;

use tracing::info;

use quiz_core::model::QuizId;
use storage::repository::{QuizRepository, Storage, StorageError};
use storage::samples;

use crate::Clock;
use crate::analytics_service::AnalyticsService;
use crate::error::AppServicesError;
use crate::notify::Notifier;
use crate::quiz_service::QuizService;
use crate::sessions::SessionLoopService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    quiz_service: Arc<QuizService>,
    session_loop: Arc<SessionLoopService>,
    analytics: Arc<AnalyticsService>,
}

impl AppServices {
    /// Build services over an already opened storage backend.
    #[must_use]
    pub fn new(storage: &Storage, clock: Clock, notifier: Arc<dyn Notifier>) -> Self {
        let quiz_service = Arc::new(QuizService::new(Arc::clone(&storage.quizzes)));
        let session_loop = Arc::new(SessionLoopService::new(
            clock,
            Arc::clone(&storage.quizzes),
            Arc::clone(&storage.attempts),
            notifier,
        ));
        let analytics = Arc::new(AnalyticsService::new(
            Arc::clone(&storage.quizzes),
            Arc::clone(&storage.attempts),
        ));

        Self {
            quiz_service,
            session_loop,
            analytics,
        }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// A database without quizzes gets the bundled "General Knowledge" quiz.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or sample setup fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        ensure_sample_quiz(storage.quizzes.as_ref()).await?;
        Ok(Self::new(&storage, clock, notifier))
    }

    /// Override the per-question countdown for sessions started from now on.
    #[must_use]
    pub fn with_question_time_limit(mut self, secs: u32) -> Self {
        let session_loop = (*self.session_loop).clone().with_question_time_limit(secs);
        self.session_loop = Arc::new(session_loop);
        self
    }

    #[must_use]
    pub fn quiz_service(&self) -> Arc<QuizService> {
        Arc::clone(&self.quiz_service)
    }

    #[must_use]
    pub fn session_loop(&self) -> Arc<SessionLoopService> {
        Arc::clone(&self.session_loop)
    }

    #[must_use]
    pub fn analytics(&self) -> Arc<AnalyticsService> {
        Arc::clone(&self.analytics)
    }
}

async fn ensure_sample_quiz(quizzes: &dyn QuizRepository) -> Result<(), AppServicesError> {
    if !quizzes.list_quizzes().await?.is_empty() {
        return Ok(());
    }

    let quiz = samples::general_knowledge().validate(QuizId::new(samples::GENERAL_KNOWLEDGE_ID))?;
    match quizzes.create_quiz(&quiz).await {
        Ok(quiz_id) => {
            info!(quiz_id = %quiz_id, "inserted sample quiz");
            Ok(())
        }
        Err(StorageError::Conflict) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

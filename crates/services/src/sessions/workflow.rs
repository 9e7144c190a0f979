use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use quiz_core::model::{AttemptId, QuizAttempt, QuizId};
use storage::repository::{AttemptRepository, QuizRepository, StorageError};

use super::service::{DEFAULT_QUESTION_TIME_LIMIT_SECS, QuizSession, RevealOutcome, SessionAdvance};
use super::timer::{SessionTimers, TimerEvent};
use super::view::SessionResults;
use crate::Clock;
use crate::error::SessionError;
use crate::notify::{Notification, Notifier};

const TICK: Duration = Duration::from_secs(1);

/// Tunables for new sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub question_time_limit_secs: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            question_time_limit_secs: DEFAULT_QUESTION_TIME_LIMIT_SECS,
        }
    }
}

/// Orchestrates session start, timers and attempt persistence.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    quizzes: Arc<dyn QuizRepository>,
    attempts: Arc<dyn AttemptRepository>,
    notifier: Arc<dyn Notifier>,
    settings: SessionSettings,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        quizzes: Arc<dyn QuizRepository>,
        attempts: Arc<dyn AttemptRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            clock,
            quizzes,
            attempts,
            notifier,
            settings: SessionSettings::default(),
        }
    }

    /// Seconds per question; values below 1 are raised to 1.
    #[must_use]
    pub fn with_question_time_limit(mut self, secs: u32) -> Self {
        self.settings.question_time_limit_secs = secs.max(1);
        self
    }

    #[must_use]
    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    /// Load a quiz and start taking it.
    ///
    /// Both timers start immediately unless the quiz has no questions, in which
    /// case the session is returned already completed.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::QuizNotFound` if the quiz does not exist, or
    /// `SessionError::Storage` for other repository failures.
    pub async fn start_session(&self, quiz_id: &QuizId) -> Result<ActiveSession, SessionError> {
        let quiz = match self.quizzes.get_quiz(quiz_id).await {
            Ok(quiz) => quiz,
            Err(StorageError::NotFound) => {
                self.notifier.notify(Notification::error(
                    "Quiz Not Found",
                    "The requested quiz could not be found",
                ));
                return Err(SessionError::QuizNotFound(quiz_id.clone()));
            }
            Err(err) => return Err(err.into()),
        };

        let session = QuizSession::new(Arc::new(quiz), self.settings.question_time_limit_secs);
        let mut active = ActiveSession {
            session,
            timers: None,
            events: None,
            started: Instant::now(),
            clock: self.clock,
            attempts: Arc::clone(&self.attempts),
            notifier: Arc::clone(&self.notifier),
            pending_attempt: None,
            saved_attempt: None,
        };

        if active.session.is_complete() {
            self.notifier.notify(Notification::info(
                "Empty Quiz",
                "This quiz has no questions to answer",
            ));
        } else {
            active.start_timers();
        }
        info!(quiz_id = %quiz_id, questions = active.session.quiz().question_count(), "session started");
        Ok(active)
    }
}

/// A running session: the engine plus its timers and persistence hooks.
///
/// All inputs (user actions and timer events) are applied through `&mut self`,
/// so they are handled one at a time in arrival order. Dropping the session
/// cancels its timers and never records an attempt.
pub struct ActiveSession {
    session: QuizSession,
    timers: Option<SessionTimers>,
    events: Option<UnboundedReceiver<TimerEvent>>,
    /// Start of the current run; the source of `time_spent_secs`.
    started: Instant,
    clock: Clock,
    attempts: Arc<dyn AttemptRepository>,
    notifier: Arc<dyn Notifier>,
    pending_attempt: Option<QuizAttempt>,
    saved_attempt: Option<AttemptId>,
}

impl ActiveSession {
    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.session.is_complete()
    }

    #[must_use]
    pub fn results(&self) -> Option<SessionResults> {
        self.session.results()
    }

    /// Completed attempt that could not be saved yet.
    #[must_use]
    pub fn pending_attempt(&self) -> Option<&QuizAttempt> {
        self.pending_attempt.as_ref()
    }

    #[must_use]
    pub fn saved_attempt_id(&self) -> Option<AttemptId> {
        self.saved_attempt
    }

    /// # Errors
    ///
    /// See [`QuizSession::select_option`].
    pub fn select_option(&mut self, index: usize) -> Result<(), SessionError> {
        self.session.select_option(index)
    }

    /// Reveal the current question, stop its countdown and notify the outcome.
    ///
    /// # Errors
    ///
    /// See [`QuizSession::reveal_answer`].
    pub fn reveal_answer(&mut self) -> Result<RevealOutcome, SessionError> {
        let outcome = self.session.reveal_answer()?;
        self.after_reveal(&outcome);
        Ok(outcome)
    }

    /// Wait for the next timer tick.
    ///
    /// Returns `None` once the timers are gone (completion, empty quiz or
    /// abandonment), so callers should stop polling then.
    pub async fn next_timer_event(&mut self) -> Option<TimerEvent> {
        match self.events.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    /// Apply a tick received from [`next_timer_event`](Self::next_timer_event).
    ///
    /// Returns the outcome when the tick exhausted the countdown. Ticks that
    /// belong to an earlier question or arrive after completion are dropped.
    pub fn handle_timer_event(&mut self, event: TimerEvent) -> Option<RevealOutcome> {
        match event {
            TimerEvent::Elapsed => {
                self.sync_elapsed();
                None
            }
            TimerEvent::Countdown { question_index } => {
                match self.session.tick_countdown(question_index) {
                    Ok(Some(outcome)) => {
                        debug!(question_index, "countdown expired");
                        self.after_reveal(&outcome);
                        Some(outcome)
                    }
                    Ok(None) => None,
                    Err(err) => {
                        debug!(error = %err, "dropping countdown tick");
                        None
                    }
                }
            }
        }
    }

    /// Move past a revealed question.
    ///
    /// On the last question the timers are cancelled and the attempt is
    /// appended. A failed append is reported through the notifier and the log
    /// but does not fail the call: the session is still `Completed` and the
    /// attempt stays pending for [`save_pending_attempt`](Self::save_pending_attempt).
    ///
    /// # Errors
    ///
    /// See [`QuizSession::next_question`].
    pub async fn next_question(&mut self) -> Result<SessionAdvance, SessionError> {
        self.sync_elapsed();
        let advance = self.session.next_question(self.clock.now())?;
        match &advance {
            SessionAdvance::Next { question_index } => {
                if let Some(timers) = self.timers.as_mut() {
                    timers.restart_countdown(*question_index);
                }
            }
            SessionAdvance::Completed(attempt) => {
                self.stop_timers();
                info!(
                    quiz_id = %attempt.quiz_id(),
                    score = attempt.score(),
                    total = attempt.total_questions(),
                    time_spent_secs = attempt.time_spent_secs(),
                    "session completed"
                );
                self.pending_attempt = Some(attempt.clone());
                self.saved_attempt = None;
                let _ = self.persist_pending().await;
            }
        }
        Ok(advance)
    }

    /// Retry persisting a completed attempt whose first append failed.
    ///
    /// Returns the id of the saved attempt; calling it again after success is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InProgress` if there is nothing to save, or
    /// `SessionError::Storage` if the append fails again.
    pub async fn save_pending_attempt(&mut self) -> Result<AttemptId, SessionError> {
        self.persist_pending().await
    }

    /// Start over on the same quiz with fresh timers.
    ///
    /// An attempt that is still pending is discarded.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InProgress` unless the session is completed.
    pub fn retry(&mut self) -> Result<(), SessionError> {
        self.session.retry()?;
        if let Some(attempt) = self.pending_attempt.take() {
            warn!(attempt_id = %attempt.id(), "discarding unsaved attempt on retry");
        }
        self.saved_attempt = None;
        self.stop_timers();
        self.started = Instant::now();
        if !self.session.is_complete() {
            self.start_timers();
        }
        info!(quiz_id = %self.session.quiz().id(), "session restarted");
        Ok(())
    }

    /// Leave the session without recording anything.
    pub fn abandon(mut self) {
        self.stop_timers();
        info!(
            quiz_id = %self.session.quiz().id(),
            answered = self.session.answers().len(),
            "session abandoned"
        );
    }

    fn sync_elapsed(&mut self) {
        self.session.record_elapsed(self.started.elapsed().as_secs());
    }

    fn start_timers(&mut self) {
        let (timers, events) = SessionTimers::start(TICK, self.session.current_index());
        self.timers = Some(timers);
        self.events = Some(events);
    }

    fn stop_timers(&mut self) {
        if let Some(mut timers) = self.timers.take() {
            timers.cancel();
        }
        self.events = None;
    }

    fn after_reveal(&mut self, outcome: &RevealOutcome) {
        if let Some(timers) = self.timers.as_mut() {
            timers.stop_countdown();
        }
        let notification = if outcome.is_correct {
            Notification::success("Correct!", "Good job!")
        } else {
            Notification::error(
                "Incorrect",
                format!("The correct answer was: {}", outcome.correct_option),
            )
        };
        self.notifier.notify(notification);
    }

    async fn persist_pending(&mut self) -> Result<AttemptId, SessionError> {
        if let Some(id) = self.saved_attempt {
            return Ok(id);
        }
        let Some(attempt) = self.pending_attempt.as_ref() else {
            return Err(SessionError::InProgress);
        };

        let id = attempt.id();
        match self.attempts.append_attempt(attempt).await {
            // A conflict means an earlier append went through after all.
            Ok(()) | Err(StorageError::Conflict) => {
                self.pending_attempt = None;
                self.saved_attempt = Some(id);
                self.notifier.notify(Notification::info(
                    "Quiz Completed!",
                    "Your results have been saved.",
                ));
                Ok(id)
            }
            Err(err) => {
                warn!(attempt_id = %id, error = %err, "failed to save attempt");
                self.notifier.notify(Notification::error(
                    "Results Not Saved",
                    "Your results could not be saved. Try again later.",
                ));
                Err(err.into())
            }
        }
    }
}

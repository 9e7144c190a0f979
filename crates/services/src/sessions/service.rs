use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

use quiz_core::model::{Quiz, QuizAttempt, QuizQuestion};

use super::progress::SessionProgress;
use super::view::SessionResults;
use crate::error::SessionError;

/// Seconds allowed per question unless configured otherwise.
pub const DEFAULT_QUESTION_TIME_LIMIT_SECS: u32 = 15;

//
// ─── PHASES & OUTCOMES ─────────────────────────────────────────────────────────
//

/// Where the session is for the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Question shown, countdown running, selection allowed.
    Presenting,
    /// Correctness shown and scored; waiting for `next_question`.
    Revealed,
    Completed,
}

/// What happened when a question was revealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealOutcome {
    pub question_index: usize,
    pub selected: Option<usize>,
    pub correct_answer: usize,
    pub correct_option: String,
    pub is_correct: bool,
    /// The countdown reached zero before a manual reveal.
    pub timed_out: bool,
}

/// Result of moving past a revealed question.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAdvance {
    Next { question_index: usize },
    /// The last question was passed; the attempt still has to be persisted.
    Completed(QuizAttempt),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory state machine for one pass through a quiz.
///
/// `Presenting(i) -> Revealed(i) -> Presenting(i + 1) | Completed`. The session
/// never touches storage or timers itself: callers feed it timer ticks and
/// persist the attempt returned on completion.
pub struct QuizSession {
    quiz: Arc<Quiz>,
    time_limit_secs: u32,
    current: usize,
    phase: SessionPhase,
    selected: Option<usize>,
    answers: Vec<Option<usize>>,
    score: u32,
    remaining_secs: u32,
    elapsed_secs: u64,
}

impl QuizSession {
    /// Start a session at the first question with a full countdown.
    ///
    /// A quiz without questions starts out `Completed` with a score of 0.
    #[must_use]
    pub fn new(quiz: Arc<Quiz>, time_limit_secs: u32) -> Self {
        let time_limit_secs = time_limit_secs.max(1);
        let phase = initial_phase(&quiz);
        let capacity = quiz.question_count();
        Self {
            quiz,
            time_limit_secs,
            current: 0,
            phase,
            selected: None,
            answers: Vec::with_capacity(capacity),
            score: 0,
            remaining_secs: time_limit_secs,
            elapsed_secs: 0,
        }
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The question being shown; `None` once completed.
    #[must_use]
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        if self.is_complete() {
            return None;
        }
        self.quiz.question(self.current)
    }

    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Answers of every revealed question, by position.
    #[must_use]
    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.phase == SessionPhase::Revealed
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Completed
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress::new(
            self.current,
            self.quiz.question_count(),
            self.answers.len(),
            self.remaining_secs,
            self.is_complete(),
        )
    }

    /// Final results; `None` until the session is completed.
    #[must_use]
    pub fn results(&self) -> Option<SessionResults> {
        self.is_complete().then(|| {
            SessionResults::from_answers(&self.quiz, &self.answers, self.score, self.elapsed_secs)
        })
    }

    /// Choose an option for the current question. The last choice wins.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyRevealed` or `SessionError::Completed`
    /// outside `Presenting`, and `SessionError::InvalidOption` when `index` is
    /// not an option of the current question.
    pub fn select_option(&mut self, index: usize) -> Result<(), SessionError> {
        let question = self.presenting_question()?;
        let options = question.options().len();
        if index >= options {
            return Err(SessionError::InvalidOption { index, options });
        }
        self.selected = Some(index);
        Ok(())
    }

    /// Reveal the current question and score the current selection.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyRevealed` or `SessionError::Completed`
    /// outside `Presenting`.
    pub fn reveal_answer(&mut self) -> Result<RevealOutcome, SessionError> {
        self.reveal(false)
    }

    /// Apply one second of the per-question countdown for `question_index`.
    ///
    /// Returns the reveal outcome when this tick exhausted the countdown.
    /// Ticks after the reveal are ignored.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::StaleQuestion` when the tick belongs to another
    /// question, and `SessionError::Completed` after completion.
    pub fn tick_countdown(
        &mut self,
        question_index: usize,
    ) -> Result<Option<RevealOutcome>, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        if question_index != self.current {
            return Err(SessionError::StaleQuestion {
                fired: question_index,
                current: self.current,
            });
        }
        if self.phase == SessionPhase::Revealed {
            return Ok(None);
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            return self.reveal(true).map(Some);
        }
        Ok(None)
    }

    /// Apply one second of session-wide elapsed time. No effect once completed.
    pub fn tick_elapsed(&mut self) {
        if !self.is_complete() {
            self.elapsed_secs = self.elapsed_secs.saturating_add(1);
        }
    }

    /// Set session-wide elapsed time from an external measurement.
    ///
    /// Never moves the value backwards. No effect once completed.
    pub fn record_elapsed(&mut self, secs: u64) {
        if !self.is_complete() {
            self.elapsed_secs = self.elapsed_secs.max(secs);
        }
    }

    /// Move past a revealed question.
    ///
    /// On the last question the session completes and the attempt is built
    /// with `completed_at` as its date.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotRevealed` while presenting and
    /// `SessionError::Completed` after completion.
    pub fn next_question(
        &mut self,
        completed_at: DateTime<Utc>,
    ) -> Result<SessionAdvance, SessionError> {
        match self.phase {
            SessionPhase::Presenting => return Err(SessionError::NotRevealed),
            SessionPhase::Completed => return Err(SessionError::Completed),
            SessionPhase::Revealed => {}
        }

        let next = self.current + 1;
        if next < self.quiz.question_count() {
            self.current = next;
            self.selected = None;
            self.remaining_secs = self.time_limit_secs;
            self.phase = SessionPhase::Presenting;
            return Ok(SessionAdvance::Next {
                question_index: next,
            });
        }

        self.phase = SessionPhase::Completed;
        let total = u32::try_from(self.quiz.question_count()).unwrap_or(u32::MAX);
        Ok(SessionAdvance::Completed(QuizAttempt::new(
            self.quiz.id().clone(),
            completed_at,
            self.score,
            total,
            self.answers.clone(),
            self.elapsed_secs,
        )))
    }

    /// Start over from the first question with the same quiz.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InProgress` unless the session is completed.
    pub fn retry(&mut self) -> Result<(), SessionError> {
        if !self.is_complete() {
            return Err(SessionError::InProgress);
        }
        self.current = 0;
        self.phase = initial_phase(&self.quiz);
        self.selected = None;
        self.answers.clear();
        self.score = 0;
        self.remaining_secs = self.time_limit_secs;
        self.elapsed_secs = 0;
        Ok(())
    }

    fn presenting_question(&self) -> Result<&QuizQuestion, SessionError> {
        match self.phase {
            SessionPhase::Revealed => Err(SessionError::AlreadyRevealed),
            SessionPhase::Completed => Err(SessionError::Completed),
            SessionPhase::Presenting => self
                .quiz
                .question(self.current)
                .ok_or(SessionError::Completed),
        }
    }

    fn reveal(&mut self, timed_out: bool) -> Result<RevealOutcome, SessionError> {
        let question = self.presenting_question()?;
        let is_correct = question.is_correct(self.selected);
        let outcome = RevealOutcome {
            question_index: self.current,
            selected: self.selected,
            correct_answer: question.correct_answer(),
            correct_option: question.correct_option().unwrap_or_default().to_owned(),
            is_correct,
            timed_out,
        };

        if is_correct {
            self.score += 1;
        }
        self.answers.push(self.selected);
        if timed_out {
            self.remaining_secs = 0;
        }
        self.phase = SessionPhase::Revealed;
        Ok(outcome)
    }
}

fn initial_phase(quiz: &Quiz) -> SessionPhase {
    if quiz.is_empty() {
        SessionPhase::Completed
    } else {
        SessionPhase::Presenting
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("quiz_id", self.quiz.id())
            .field("questions", &self.quiz.question_count())
            .field("current", &self.current)
            .field("phase", &self.phase)
            .field("selected", &self.selected)
            .field("score", &self.score)
            .field("remaining_secs", &self.remaining_secs)
            .field("elapsed_secs", &self.elapsed_secs)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuizId;
    use quiz_core::time::fixed_now;
    use storage::samples;

    fn session() -> QuizSession {
        QuizSession::new(
            Arc::new(samples::general_knowledge_quiz()),
            DEFAULT_QUESTION_TIME_LIMIT_SECS,
        )
    }

    fn answer(session: &mut QuizSession, option: Option<usize>) -> RevealOutcome {
        if let Some(option) = option {
            session.select_option(option).unwrap();
        }
        session.reveal_answer().unwrap()
    }

    #[test]
    fn full_run_completes_with_one_attempt() {
        let mut session = session();
        let picks = [Some(2), Some(0), Some(1)];

        let mut attempt = None;
        for pick in picks {
            answer(&mut session, pick);
            if let SessionAdvance::Completed(a) = session.next_question(fixed_now()).unwrap() {
                attempt = Some(a);
            }
        }

        let attempt = attempt.expect("last next_question completes");
        assert!(session.is_complete());
        assert_eq!(attempt.total_questions(), 3);
        assert_eq!(attempt.answers(), &[Some(2), Some(0), Some(1)]);
        assert_eq!(attempt.score(), 2);
        assert_eq!(attempt.date(), fixed_now());
        assert_eq!(attempt.quiz_id(), &QuizId::new(samples::GENERAL_KNOWLEDGE_ID));
    }

    #[test]
    fn score_matches_positional_correctness() {
        let mut session = session();
        let quiz = samples::general_knowledge_quiz();
        for pick in [Some(1), None, Some(1)] {
            answer(&mut session, pick);
            let _ = session.next_question(fixed_now()).unwrap();
        }

        let expected = quiz
            .questions()
            .iter()
            .zip(session.answers())
            .filter(|(q, a)| q.is_correct(**a))
            .count();
        assert_eq!(session.score() as usize, expected);
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn selection_overwrites_until_reveal() {
        let mut session = session();
        session.select_option(0).unwrap();
        session.select_option(2).unwrap();
        assert_eq!(session.selected(), Some(2));

        let outcome = session.reveal_answer().unwrap();
        assert!(outcome.is_correct);
        assert_eq!(outcome.correct_option, "Paris");

        let err = session.select_option(1).unwrap_err();
        assert!(matches!(err, SessionError::AlreadyRevealed));
        assert_eq!(session.selected(), Some(2));
    }

    #[test]
    fn out_of_range_selection_leaves_state_untouched() {
        let mut session = session();
        session.select_option(1).unwrap();
        let err = session.select_option(4).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidOption {
                index: 4,
                options: 4
            }
        ));
        assert_eq!(session.selected(), Some(1));
        assert_eq!(session.phase(), SessionPhase::Presenting);
    }

    #[test]
    fn countdown_expiry_without_selection_reveals_incorrect() {
        let mut session = session();
        for _ in 0..DEFAULT_QUESTION_TIME_LIMIT_SECS - 1 {
            assert_eq!(session.tick_countdown(0).unwrap(), None);
        }
        assert_eq!(session.remaining_secs(), 1);

        let outcome = session.tick_countdown(0).unwrap().expect("expiry reveals");
        assert!(outcome.timed_out);
        assert!(!outcome.is_correct);
        assert_eq!(outcome.selected, None);
        assert!(session.is_revealed());
        assert_eq!(session.score(), 0);
        assert_eq!(session.answers(), &[None]);

        // Further ticks for the same question never reveal twice.
        assert_eq!(session.tick_countdown(0).unwrap(), None);
        assert_eq!(session.answers().len(), 1);
    }

    #[test]
    fn countdown_expiry_uses_current_selection() {
        let mut session = QuizSession::new(Arc::new(samples::general_knowledge_quiz()), 2);
        session.select_option(2).unwrap();
        assert_eq!(session.tick_countdown(0).unwrap(), None);
        let outcome = session.tick_countdown(0).unwrap().unwrap();
        assert!(outcome.is_correct);
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn stale_countdown_tick_is_rejected() {
        let mut session = session();
        answer(&mut session, Some(2));
        session.next_question(fixed_now()).unwrap();
        let remaining = session.remaining_secs();

        let err = session.tick_countdown(0).unwrap_err();
        assert!(matches!(
            err,
            SessionError::StaleQuestion {
                fired: 0,
                current: 1
            }
        ));
        assert_eq!(session.remaining_secs(), remaining);
    }

    #[test]
    fn next_question_resets_countdown_and_selection() {
        let mut session = session();
        session.tick_countdown(0).unwrap();
        answer(&mut session, Some(3));

        let advance = session.next_question(fixed_now()).unwrap();
        assert_eq!(advance, SessionAdvance::Next { question_index: 1 });
        assert_eq!(session.selected(), None);
        assert_eq!(session.remaining_secs(), DEFAULT_QUESTION_TIME_LIMIT_SECS);
        assert_eq!(session.phase(), SessionPhase::Presenting);
    }

    #[test]
    fn next_question_requires_reveal() {
        let mut session = session();
        let err = session.next_question(fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::NotRevealed));
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn elapsed_time_accumulates_across_questions() {
        let mut session = session();
        for _ in 0..4 {
            session.tick_elapsed();
        }
        answer(&mut session, Some(2));
        session.next_question(fixed_now()).unwrap();
        for _ in 0..3 {
            session.tick_elapsed();
        }
        answer(&mut session, Some(1));
        session.next_question(fixed_now()).unwrap();
        answer(&mut session, Some(1));

        let SessionAdvance::Completed(attempt) = session.next_question(fixed_now()).unwrap() else {
            panic!("expected completion");
        };
        assert_eq!(attempt.time_spent_secs(), 7);

        session.tick_elapsed();
        assert_eq!(session.elapsed_secs(), 7);
    }

    #[test]
    fn recorded_elapsed_never_moves_backwards() {
        let mut session = session();
        session.record_elapsed(9);
        session.record_elapsed(4);
        assert_eq!(session.elapsed_secs(), 9);
        session.tick_elapsed();
        assert_eq!(session.elapsed_secs(), 10);
    }

    #[test]
    fn retry_resets_to_first_question() {
        let mut session = session();
        assert!(matches!(session.retry().unwrap_err(), SessionError::InProgress));

        for pick in [Some(2), Some(1), Some(1)] {
            session.tick_elapsed();
            answer(&mut session, pick);
            let _ = session.next_question(fixed_now()).unwrap();
        }
        assert_eq!(session.score(), 3);

        session.retry().unwrap();
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.score(), 0);
        assert!(session.answers().is_empty());
        assert_eq!(session.elapsed_secs(), 0);
        assert_eq!(session.remaining_secs(), DEFAULT_QUESTION_TIME_LIMIT_SECS);
        assert_eq!(session.phase(), SessionPhase::Presenting);
    }

    #[test]
    fn empty_quiz_starts_completed() {
        let quiz = Quiz::from_persisted(QuizId::new("empty"), "Empty", "Nothing here", Vec::new());
        let mut session = QuizSession::new(Arc::new(quiz), DEFAULT_QUESTION_TIME_LIMIT_SECS);

        assert!(session.is_complete());
        assert_eq!(session.score(), 0);
        assert!(session.current_question().is_none());
        assert!(matches!(session.select_option(0).unwrap_err(), SessionError::Completed));
        assert!(matches!(session.reveal_answer().unwrap_err(), SessionError::Completed));
        assert!(matches!(
            session.next_question(fixed_now()).unwrap_err(),
            SessionError::Completed
        ));

        session.retry().unwrap();
        assert!(session.is_complete());
        assert_eq!(session.results().unwrap().total, 0);
    }
}

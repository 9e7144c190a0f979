mod progress;
mod service;
mod timer;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::SessionProgress;
pub use service::{
    DEFAULT_QUESTION_TIME_LIMIT_SECS, QuizSession, RevealOutcome, SessionAdvance, SessionPhase,
};
pub use timer::{SessionTimers, TimerEvent};
pub use view::{QuestionReview, SessionResults, Verdict, format_duration};
pub use workflow::{ActiveSession, SessionLoopService, SessionSettings};

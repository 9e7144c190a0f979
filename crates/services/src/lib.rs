#![forbid(unsafe_code)]

pub mod analytics_service;
pub mod app_services;
pub mod error;
pub mod notify;
pub mod quiz_service;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use analytics_service::AnalyticsService;
pub use app_services::AppServices;
pub use error::{AnalyticsError, AppServicesError, QuizServiceError, SessionError};
pub use notify::{LogNotifier, Notification, NotificationLevel, Notifier};
pub use quiz_service::QuizService;

pub use sessions::{
    ActiveSession, QuizSession, RevealOutcome, SessionAdvance, SessionLoopService, SessionPhase,
    SessionProgress, SessionResults, SessionSettings, TimerEvent, Verdict,
};

use std::fmt;

use tracing::{info, warn};

/// Severity of a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A short user-facing message, e.g. "Correct!" after a reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
}

impl Notification {
    #[must_use]
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_level(NotificationLevel::Info, title, description)
    }

    #[must_use]
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_level(NotificationLevel::Success, title, description)
    }

    #[must_use]
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_level(NotificationLevel::Error, title, description)
    }

    fn with_level(
        level: NotificationLevel,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            level,
            title: title.into(),
            description: description.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            f.write_str(&self.title)
        } else {
            write!(f, "{}: {}", self.title, self.description)
        }
    }
}

/// Fire-and-forget sink for user-facing messages.
///
/// Implementations must return promptly; callers never wait on delivery.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Notifier that only writes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => warn!(title = %notification.title, "{}", notification.description),
            NotificationLevel::Info | NotificationLevel::Success => {
                info!(title = %notification.title, "{}", notification.description);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_title_and_description() {
        let n = Notification::error("Incorrect", "The correct answer was: Paris");
        assert_eq!(n.to_string(), "Incorrect: The correct answer was: Paris");
        assert_eq!(Notification::info("Done", "").to_string(), "Done");
    }
}

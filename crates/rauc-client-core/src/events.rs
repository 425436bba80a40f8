//! Events delivered by an installer session and their translation into
//! human-readable status lines.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Classes of events a session can be subscribed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventClass {
    /// Installer property changes and service invalidation
    StatusChanged,
    /// Install completion
    Completed,
}

impl std::fmt::Display for EventClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StatusChanged => write!(f, "status"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Installer progress triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Overall completion in percent
    pub percentage: i32,
    /// Description of the current step
    pub message: String,
    /// Nesting depth of the current step
    pub depth: i32,
}

/// The subset of installer properties reported in one change notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyChanges {
    /// Name of the running operation
    pub operation: Option<String>,
    /// Current progress
    pub progress: Option<Progress>,
    /// Last error reported by the installer
    pub last_error: Option<String>,
}

impl PropertyChanges {
    /// Whether no property of interest changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operation.is_none() && self.progress.is_none() && self.last_error.is_none()
    }

    /// Status line for this notification.
    ///
    /// Operation takes precedence over progress, which takes precedence over the
    /// last error. An empty last error clears the error and yields nothing.
    #[must_use]
    pub fn status_message(&self) -> Option<String> {
        if let Some(operation) = &self.operation {
            return Some(operation.clone());
        }
        if let Some(progress) = &self.progress {
            return Some(format!("{:3}% {}", progress.percentage, progress.message));
        }
        match self.last_error.as_deref() {
            Some(error) if !error.is_empty() => Some(format!("LastError: {}", error)),
            _ => None,
        }
    }
}

/// Event produced by an installer session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Installer properties changed
    PropertiesChanged(PropertyChanges),
    /// The installer service disappeared
    Invalidated,
    /// The install finished with the given raw result
    Completed(i32),
}

impl SessionEvent {
    /// Event class this event is delivered under.
    #[must_use]
    pub fn class(&self) -> EventClass {
        match self {
            Self::PropertiesChanged(_) | Self::Invalidated => EventClass::StatusChanged,
            Self::Completed(_) => EventClass::Completed,
        }
    }
}

/// Channel half a session pushes its events into.
pub type EventSink = mpsc::UnboundedSender<SessionEvent>;

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(percentage: i32, message: &str, depth: i32) -> Progress {
        Progress {
            percentage,
            message: message.to_string(),
            depth,
        }
    }

    #[test]
    fn test_progress_is_padded_to_three_columns() {
        let changes = PropertyChanges {
            progress: Some(progress(42, "Installing", 1)),
            ..Default::default()
        };
        assert_eq!(changes.status_message().as_deref(), Some(" 42% Installing"));

        let changes = PropertyChanges {
            progress: Some(progress(100, "Installing done.", 1)),
            ..Default::default()
        };
        assert_eq!(
            changes.status_message().as_deref(),
            Some("100% Installing done.")
        );

        let changes = PropertyChanges {
            progress: Some(progress(0, "Installing", 1)),
            ..Default::default()
        };
        assert_eq!(changes.status_message().as_deref(), Some("  0% Installing"));
    }

    #[test]
    fn test_operation_is_verbatim() {
        let changes = PropertyChanges {
            operation: Some("installing".to_string()),
            ..Default::default()
        };
        assert_eq!(changes.status_message().as_deref(), Some("installing"));
    }

    #[test]
    fn test_operation_wins_over_progress_and_error() {
        let changes = PropertyChanges {
            operation: Some("idle".to_string()),
            progress: Some(progress(100, "done", 1)),
            last_error: Some("boom".to_string()),
        };
        assert_eq!(changes.status_message().as_deref(), Some("idle"));

        let changes = PropertyChanges {
            operation: None,
            progress: Some(progress(5, "Checking", 2)),
            last_error: Some("boom".to_string()),
        };
        assert_eq!(changes.status_message().as_deref(), Some("  5% Checking"));
    }

    #[test]
    fn test_last_error() {
        let changes = PropertyChanges {
            last_error: Some("Failed to check bundle".to_string()),
            ..Default::default()
        };
        assert_eq!(
            changes.status_message().as_deref(),
            Some("LastError: Failed to check bundle")
        );
    }

    #[test]
    fn test_empty_last_error_is_not_a_status() {
        let changes = PropertyChanges {
            last_error: Some(String::new()),
            ..Default::default()
        };
        assert!(!changes.is_empty());
        assert_eq!(changes.status_message(), None);
    }

    #[test]
    fn test_nothing_of_interest() {
        let changes = PropertyChanges::default();
        assert!(changes.is_empty());
        assert_eq!(changes.status_message(), None);
    }

    #[test]
    fn test_event_class() {
        assert_eq!(SessionEvent::Invalidated.class(), EventClass::StatusChanged);
        assert_eq!(
            SessionEvent::PropertiesChanged(PropertyChanges::default()).class(),
            EventClass::StatusChanged
        );
        assert_eq!(SessionEvent::Completed(0).class(), EventClass::Completed);
        assert_eq!(EventClass::StatusChanged.to_string(), "status");
    }
}

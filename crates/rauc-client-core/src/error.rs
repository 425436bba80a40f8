//! Error types for rauc-client-core
//!
//! Every failure inside an install operation is turned into a terminal
//! [`ResultCode`](crate::ResultCode) by the worker. These errors exist so the
//! worker can log what went wrong and so front ends can explain it.

use crate::events::EventClass;
use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// The installer session could not be established
    #[error("connection error: {0}")]
    Connection(String),

    /// Registering for one of the session's event classes failed
    #[error("failed to subscribe to {class} events: {message}")]
    Subscription {
        /// Event class that could not be registered
        class: EventClass,
        /// Detailed message
        message: String,
    },

    /// The install request was rejected by the remote service
    #[error("install request failed: {0}")]
    Invocation(String),

    /// The worker thread or its private runtime could not be started
    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),

    /// Invalid installer configuration
    #[error("invalid configuration: {field}")]
    InvalidConfig {
        /// Config field name
        field: String,
        /// Detailed message
        message: String,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Trait for user-friendly error messages
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get a suggestion for how to fix the error
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for Error {
    fn user_message(&self) -> String {
        match self {
            Error::Connection(msg) => format!("Cannot reach the installer service: {}", msg),
            Error::Subscription { class, message } => {
                format!("Cannot listen for {} events: {}", class, message)
            }
            Error::Invocation(msg) => format!("The installer rejected the bundle: {}", msg),
            Error::Runtime(e) => format!("Cannot start the install worker: {}", e),
            Error::InvalidConfig { field, message } => {
                format!("Configuration error in '{}': {}", field, message)
            }
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Error::Connection(_) => Some(
                "Check that the RAUC service is running, or set DBUS_STARTER_BUS_TYPE=session \
                 to talk to a session-bus instance."
                    .to_string(),
            ),
            Error::Invocation(_) => {
                Some("Check the bundle path and the installer's LastError.".to_string())
            }
            Error::InvalidConfig { field, .. } => Some(format!(
                "Check the '{}' setting in config/local.toml or the RAUC_CLIENT_ environment.",
                field
            )),
            _ => None,
        }
    }
}

/// Format an error for display in the CLI
pub fn format_error_for_cli(error: &Error) -> String {
    let mut output = error.user_message();

    if let Some(suggestion) = error.suggestion() {
        output.push_str("\n\n");
        output.push_str(&suggestion);
    }

    output
}

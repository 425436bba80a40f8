//! Decoding of installer signals into session events.

use crate::proxy::INSTALLER_INTERFACE;
use rauc_client_core::{Progress, PropertyChanges, SessionEvent};
use std::collections::HashMap;
use zbus::zvariant::Value;

/// Pick the installer properties out of a `PropertiesChanged` dictionary.
///
/// Unknown properties and values of an unexpected type are skipped.
pub fn property_changes(changed: &HashMap<&str, Value<'_>>) -> PropertyChanges {
    PropertyChanges {
        operation: changed.get("Operation").and_then(string),
        progress: changed.get("Progress").and_then(progress),
        last_error: changed.get("LastError").and_then(string),
    }
}

/// Session event for one `PropertiesChanged` signal.
///
/// Signals for other interfaces and change sets without installer properties
/// yield nothing. Any invalidated property means the installer went away.
pub fn status_event(
    interface: &str,
    changed: &HashMap<&str, Value<'_>>,
    invalidated: &[&str],
) -> Option<SessionEvent> {
    if interface != INSTALLER_INTERFACE {
        return None;
    }
    if !invalidated.is_empty() {
        return Some(SessionEvent::Invalidated);
    }
    let changes = property_changes(changed);
    (!changes.is_empty()).then_some(SessionEvent::PropertiesChanged(changes))
}

/// Session event for one item of the service owner stream.
///
/// `None` is the end of the stream and `Some(None)` a lost owner; both mean
/// the installer is gone. A new owner yields nothing.
pub fn owner_event<T>(owner: Option<Option<T>>) -> Option<SessionEvent> {
    match owner {
        Some(Some(_)) => None,
        Some(None) | None => Some(SessionEvent::Invalidated),
    }
}

fn string(value: &Value<'_>) -> Option<String> {
    match value {
        Value::Str(s) => Some(s.to_string()),
        Value::Value(inner) => string(inner),
        _ => None,
    }
}

fn progress(value: &Value<'_>) -> Option<Progress> {
    match value {
        Value::Structure(fields) => match fields.fields() {
            [Value::I32(percentage), message, Value::I32(depth)] => Some(Progress {
                percentage: *percentage,
                message: string(message)?,
                depth: *depth,
            }),
            _ => None,
        },
        Value::Value(inner) => progress(inner),
        _ => None,
    }
}

//! Shared state for a single install operation.

use crate::main_loop::LoopContext;
use crate::result::ResultCode;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};
use uuid::Uuid;

/// Callback invoked with the context whenever status lines are queued.
pub type StatusCallback = std::sync::Arc<dyn Fn(&InstallContext) + Send + Sync>;

/// Callback invoked once with the context when the operation has finished.
pub type CompletionCallback = Box<dyn FnOnce(&InstallContext) + Send>;

/// State guarded by the context lock.
///
/// The result and the status queue are always read and written together.
#[derive(Debug, Default)]
pub struct InstallState {
    result: ResultCode,
    messages: VecDeque<String>,
}

impl InstallState {
    /// Current result code.
    #[must_use]
    pub fn result(&self) -> ResultCode {
        self.result
    }

    /// Record a result reported for the operation.
    ///
    /// A terminal result is never overwritten. Returns whether the stored value
    /// changed.
    pub fn record_result(&mut self, code: ResultCode) -> bool {
        if self.result.is_terminal() {
            if code != self.result {
                warn!(current = %self.result, ignored = %code, "Result already terminal");
            }
            return false;
        }
        let changed = self.result != code;
        self.result = code;
        changed
    }

    /// Append a status line.
    pub fn push_status(&mut self, message: String) {
        self.messages.push_back(message);
    }

    /// Take the oldest queued status line.
    pub fn pop_status(&mut self) -> Option<String> {
        self.messages.pop_front()
    }

    /// Number of queued status lines.
    #[must_use]
    pub fn pending_status(&self) -> usize {
        self.messages.len()
    }
}

/// Shared state object for one install operation.
///
/// Created by [`Installer::start_install`](crate::Installer::start_install),
/// handed to both callbacks, and dropped by the worker once the completion
/// callback has returned. Dropping a context whose result is not terminal, or
/// whose status queue still holds lines, is a bug and trips a debug assertion.
pub struct InstallContext {
    id: Uuid,
    bundle: String,
    state: Mutex<InstallState>,
    notify_event: Option<StatusCallback>,
    notify_complete: Mutex<Option<CompletionCallback>>,
    loop_context: LoopContext,
}

impl InstallContext {
    /// Create a pending context for `bundle`.
    pub fn new(
        bundle: impl Into<String>,
        notify_event: Option<StatusCallback>,
        notify_complete: Option<CompletionCallback>,
        loop_context: LoopContext,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            bundle: bundle.into(),
            state: Mutex::new(InstallState::default()),
            notify_event,
            notify_complete: Mutex::new(notify_complete),
            loop_context,
        }
    }

    /// Operation identifier used in logs.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Bundle being installed.
    #[must_use]
    pub fn bundle(&self) -> &str {
        &self.bundle
    }

    /// Lock the shared state.
    ///
    /// Never call back into the context or run a callback while holding the
    /// guard.
    pub fn lock(&self) -> MutexGuard<'_, InstallState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current result code.
    #[must_use]
    pub fn result(&self) -> ResultCode {
        self.lock().result()
    }

    /// Take every queued status line, oldest first.
    pub fn drain_status(&self) -> Vec<String> {
        let mut state = self.lock();
        std::iter::from_fn(|| state.pop_status()).collect()
    }

    /// Handle onto the worker's private loop.
    #[must_use]
    pub fn loop_context(&self) -> &LoopContext {
        &self.loop_context
    }

    pub(crate) fn status_callback(&self) -> Option<&StatusCallback> {
        self.notify_event.as_ref()
    }

    /// Move the operation to a terminal state if it is not in one yet.
    pub(crate) fn finish(&self, code: ResultCode) {
        debug_assert!(code.is_terminal());
        self.lock().record_result(code);
    }

    /// Run the completion callback. Later calls do nothing.
    pub(crate) fn notify_complete(&self) {
        let callback = self
            .notify_complete
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(callback) = callback {
            debug!(id = %self.id, "Notifying completion");
            callback(self);
        }
    }
}

impl std::fmt::Debug for InstallContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallContext")
            .field("id", &self.id)
            .field("bundle", &self.bundle)
            .field("state", &*self.lock())
            .field("notify_event", &self.notify_event.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for InstallContext {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        let state = self
            .state
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        debug_assert!(
            state.result.is_terminal(),
            "install context released with non-terminal result {}",
            state.result
        );
        debug_assert!(
            state.messages.is_empty(),
            "install context released with {} undrained status messages",
            state.messages.len()
        );
    }
}

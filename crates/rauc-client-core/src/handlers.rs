//! Session event handlers.
//!
//! These run on the worker's private loop. They update the shared state under
//! the context lock and hand notifications back to the loop instead of calling
//! the status callback directly.

use crate::context::InstallContext;
use crate::events::{PropertyChanges, SessionEvent};
use crate::result::ResultCode;
use std::sync::Arc;
use tracing::{debug, warn};

/// Route one session event to its handler.
pub(crate) fn dispatch(context: &Arc<InstallContext>, event: SessionEvent) {
    match event {
        SessionEvent::PropertiesChanged(changes) => on_status(context, &changes),
        SessionEvent::Invalidated => on_invalidated(context),
        SessionEvent::Completed(code) => on_completed(context, code),
    }
}

fn on_invalidated(context: &InstallContext) {
    warn!("Installer service disappeared");
    context.lock().record_result(ResultCode::DISCONNECTED);
    context.loop_context().quit();
}

fn on_status(context: &Arc<InstallContext>, changes: &PropertyChanges) {
    let Some(notify) = context.status_callback() else {
        return;
    };

    let pending = {
        let mut state = context.lock();
        if let Some(message) = changes.status_message() {
            state.push_status(message);
        }
        state.pending_status()
    };

    if pending > 0 {
        let notify = Arc::clone(notify);
        let target = Arc::clone(context);
        context.loop_context().invoke(move || notify(&target));
    }
}

fn on_completed(context: &InstallContext, code: i32) {
    let code = ResultCode::from_raw(code);
    debug!(result = %code, "Installer reported completion");
    context.lock().record_result(code);

    if code.is_terminal() {
        context.loop_context().quit();
    }
}

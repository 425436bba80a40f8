//! Install worker.
//!
//! Runs one install operation on a dedicated thread with its own current-thread
//! runtime. The worker connects, subscribes, requests the install, pumps session
//! events until a terminal result, and then tears everything down. Every path
//! ends with exactly one call of the completion callback.

use crate::config::Endpoint;
use crate::context::InstallContext;
use crate::error::Result;
use crate::events::EventClass;
use crate::handlers::dispatch;
use crate::main_loop::{LoopExit, MainLoop};
use crate::result::ResultCode;
use crate::session::{InstallerConnector, InstallerSession};
use std::sync::Arc;
use tokio::runtime::{Handle, Runtime};
use tokio::sync::mpsc;
use tracing::{debug, error, info, info_span, warn};

/// Lifecycle steps of an install worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Building the private runtime
    Init,
    /// Opening the installer session
    Connecting,
    /// Registering for session events
    Subscribing,
    /// Sending the install request
    Requesting,
    /// Pumping session events
    Running,
    /// Releasing the session and reporting the result
    Teardown,
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Init => write!(f, "Init"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Subscribing => write!(f, "Subscribing"),
            Self::Requesting => write!(f, "Requesting"),
            Self::Running => write!(f, "Running"),
            Self::Teardown => write!(f, "Teardown"),
        }
    }
}

/// One install operation, ready to be run on its own thread.
pub(crate) struct InstallWorker {
    context: Arc<InstallContext>,
    main_loop: MainLoop,
    connector: Arc<dyn InstallerConnector>,
    endpoint: Endpoint,
    state: WorkerState,
}

impl InstallWorker {
    pub(crate) fn new(
        context: Arc<InstallContext>,
        main_loop: MainLoop,
        connector: Arc<dyn InstallerConnector>,
        endpoint: Endpoint,
    ) -> Self {
        Self {
            context,
            main_loop,
            connector,
            endpoint,
            state: WorkerState::Init,
        }
    }

    /// Run the operation to completion on the current thread.
    ///
    /// Must not be called from inside a tokio runtime.
    pub(crate) fn run(mut self) {
        let span = info_span!(
            "install",
            id = %self.context.id(),
            bundle = %self.context.bundle()
        );
        let _enter = span.enter();

        let runtime = match build_runtime() {
            Ok(runtime) => Some(runtime),
            Err(e) => {
                error!(error = %e, "Failed to build install runtime");
                self.context.finish(ResultCode::FAILURE);
                None
            }
        };

        if let Some(runtime) = &runtime {
            match runtime.block_on(self.drive(runtime.handle().clone())) {
                Ok(LoopExit::Quit) => {}
                Ok(LoopExit::SourceClosed) => {
                    warn!("Installer session closed before completion");
                    self.context.finish(ResultCode::DISCONNECTED);
                }
                Err(e) => {
                    error!(error = %e, state = %self.state, "Install failed");
                    self.context.finish(ResultCode::FAILURE);
                }
            }
        }

        self.transition(WorkerState::Teardown);
        self.context.notify_complete();

        let Self {
            context, main_loop, ..
        } = self;
        drop(main_loop);
        drop(runtime);
        info!(result = %context.result(), "Install finished");
    }

    /// Report failure without ever having run.
    pub(crate) fn abandon(self) {
        warn!(id = %self.context.id(), "Install worker never started");
        self.context.finish(ResultCode::FAILURE);
        self.context.notify_complete();
    }

    async fn drive(&mut self, executor: Handle) -> Result<LoopExit> {
        self.transition(WorkerState::Connecting);
        debug!(
            bus = %self.endpoint.bus,
            service = %self.endpoint.service,
            path = %self.endpoint.object_path,
            "Creating installer session"
        );
        let mut session = self.connector.connect(&self.endpoint, executor).await?;

        let result = self.run_session(session.as_mut()).await;
        session.disconnect_all();
        result
    }

    async fn run_session(&mut self, session: &mut dyn InstallerSession) -> Result<LoopExit> {
        self.transition(WorkerState::Subscribing);
        let (sink, mut events) = mpsc::unbounded_channel();
        session.subscribe(EventClass::StatusChanged, sink.clone()).await?;
        session.subscribe(EventClass::Completed, sink).await?;

        self.transition(WorkerState::Requesting);
        debug!("Trying to contact installer service");
        session.install(self.context.bundle()).await?;

        self.transition(WorkerState::Running);
        let context = &self.context;
        let exit = self
            .main_loop
            .run(&mut events, |event| dispatch(context, event))
            .await;
        Ok(exit)
    }

    fn transition(&mut self, next: WorkerState) {
        debug!(from = %self.state, to = %next, "Worker state changed");
        self.state = next;
    }
}

fn build_runtime() -> Result<Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

//! Install orchestrator: the public entry point for starting installs.

use crate::config::InstallerConfig;
use crate::context::{CompletionCallback, InstallContext, StatusCallback};
use crate::error::Error;
use crate::main_loop::MainLoop;
use crate::session::InstallerConnector;
use crate::worker::InstallWorker;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Starts install operations against an installer service.
///
/// Each call to [`start_install`](Self::start_install) gets its own context,
/// worker thread and private loop; concurrent installs share nothing but the
/// connector.
#[derive(Clone)]
pub struct Installer {
    connector: Arc<dyn InstallerConnector>,
    config: InstallerConfig,
}

impl Installer {
    /// Create an installer using `connector` and `config`.
    pub fn new(connector: Arc<dyn InstallerConnector>, config: InstallerConfig) -> Self {
        Self { connector, config }
    }

    /// Installer configuration.
    #[must_use]
    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    /// Install `bundle` in the background.
    ///
    /// Returns immediately. An empty `bundle` is rejected without contacting
    /// the installer: `on_complete` runs with a failure before this returns. `on_status` runs on the worker's loop whenever
    /// status lines are queued and should drain them with
    /// [`InstallContext::drain_status`]. `on_complete` runs exactly once, on
    /// whichever path the operation ends, and reads
    /// [`InstallContext::result`]. Lines still queued when `on_complete` runs
    /// must be drained there.
    pub fn start_install(
        &self,
        bundle: &str,
        on_status: Option<StatusCallback>,
        on_complete: Option<CompletionCallback>,
    ) {
        let (loop_context, main_loop) = MainLoop::new();
        let context = Arc::new(InstallContext::new(
            bundle,
            on_status,
            on_complete,
            loop_context,
        ));
        let id = context.id();
        let endpoint = self.config.endpoint();
        debug!(%id, bundle, bus = %endpoint.bus, "Starting install");

        let worker = InstallWorker::new(context, main_loop, Arc::clone(&self.connector), endpoint);
        if bundle.is_empty() {
            warn!(%id, "Refusing to install an empty bundle path");
            worker.abandon();
            return;
        }

        let mut launch = WorkerLaunch(Some(worker));

        let spawned = std::thread::Builder::new()
            .name("installer".to_string())
            .spawn(move || {
                if let Some(worker) = launch.0.take() {
                    worker.run();
                }
            });

        match spawned {
            Ok(_) => info!(%id, "Install worker started"),
            Err(e) => error!(%id, error = %Error::from(e), "Failed to spawn install worker"),
        }
    }
}

/// Owns a worker until its thread picks it up.
///
/// If the thread never starts, the closure holding this is dropped and the
/// operation is completed as a failure on the caller's thread.
struct WorkerLaunch(Option<InstallWorker>);

impl Drop for WorkerLaunch {
    fn drop(&mut self) {
        if let Some(worker) = self.0.take() {
            worker.abandon();
        }
    }
}

//! Remote installer session interface.
//!
//! The worker only talks to the installer through these traits, so the D-Bus
//! binding lives in its own crate and tests can script a session.

use crate::config::Endpoint;
use crate::error::Result;
use crate::events::{EventClass, EventSink};
use async_trait::async_trait;
use tokio::runtime::Handle;

/// Opens sessions to an installer service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InstallerConnector: Send + Sync {
    /// Establish a session to `endpoint`.
    ///
    /// Any background work the session needs (signal pumps and the like) must
    /// be spawned on `executor`, which is the calling worker's private runtime.
    async fn connect(
        &self,
        endpoint: &Endpoint,
        executor: Handle,
    ) -> Result<Box<dyn InstallerSession>>;
}

/// A live connection to an installer service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InstallerSession: Send {
    /// Forward every event of `class` into `sink` until disconnected.
    async fn subscribe(&mut self, class: EventClass, sink: EventSink) -> Result<()>;

    /// Ask the installer to install `bundle`.
    async fn install(&self, bundle: &str) -> Result<()>;

    /// Drop every subscription made through this session.
    fn disconnect_all(&mut self);
}

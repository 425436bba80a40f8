//! RAUC Client Core - Install Orchestration
//!
//! This crate starts and monitors bundle installs on an out-of-process
//! installer service without blocking the caller:
//! - Orchestrator: non-blocking entry point that spawns one worker per install
//! - Worker: dedicated thread with a private loop driving the install session
//! - Context: shared result code and ordered status queue for one install
//! - Session: traits the installer binding implements

#![cfg_attr(not(test), forbid(unsafe_code))]
#![warn(missing_docs)]

pub mod config;
pub mod context;
pub mod error;
pub mod events;
mod handlers;
pub mod main_loop;
pub mod orchestrator;
pub mod result;
pub mod session;
pub mod worker;

pub use config::{BusSelection, BusType, Endpoint, InstallerConfig};
pub use context::{CompletionCallback, InstallContext, InstallState, StatusCallback};
pub use error::{format_error_for_cli, Error, Result, UserFriendlyError};
pub use events::{EventClass, EventSink, Progress, PropertyChanges, SessionEvent};
pub use main_loop::{LoopContext, LoopExit, MainLoop};
pub use orchestrator::Installer;
pub use result::ResultCode;
pub use session::{InstallerConnector, InstallerSession};
pub use worker::WorkerState;

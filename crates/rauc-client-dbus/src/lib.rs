//! D-Bus binding for the RAUC installer service.
//!
//! Implements the core session traits on top of a `zbus` proxy for
//! `de.pengutronix.rauc.Installer`:
//!
//! ```text
//! ┌──────────────┐   Install(s)          ┌───────────────────────┐
//! │ DbusSession  │──────────────────────>│ de.pengutronix.rauc   │
//! │ (worker rt)  │<──────────────────────│ /                     │
//! └──────────────┘   PropertiesChanged   └───────────────────────┘
//!                    Completed(i)
//! ```

#![forbid(unsafe_code)]

mod convert;
mod proxy;
mod session;

pub use convert::{owner_event, property_changes, status_event};
pub use proxy::{InstallerProxy, INSTALLER_INTERFACE};
pub use session::{DbusConnector, DbusSession};

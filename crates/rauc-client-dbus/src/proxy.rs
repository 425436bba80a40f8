//! Proxy for the installer interface.

/// Interface name the installer properties are reported under.
pub const INSTALLER_INTERFACE: &str = "de.pengutronix.rauc.Installer";

#[zbus::proxy(
    interface = "de.pengutronix.rauc.Installer",
    default_service = "de.pengutronix.rauc",
    default_path = "/",
    gen_blocking = false
)]
pub trait Installer {
    /// Install the bundle at `source`.
    fn install(&self, source: &str) -> zbus::Result<()>;

    /// Emitted once an install finished, with its result.
    #[zbus(signal)]
    fn completed(&self, result: i32) -> zbus::Result<()>;

    /// Name of the running operation.
    #[zbus(property)]
    fn operation(&self) -> zbus::Result<String>;

    /// Percentage, message and nesting depth of the current step.
    #[zbus(property)]
    fn progress(&self) -> zbus::Result<(i32, String, i32)>;

    /// Last error the installer reported.
    #[zbus(property)]
    fn last_error(&self) -> zbus::Result<String>;
}

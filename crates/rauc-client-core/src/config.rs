//! Installer endpoint configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Environment variable set by D-Bus activation to name the starter bus.
pub const STARTER_BUS_ENV: &str = "DBUS_STARTER_BUS_TYPE";

/// Well-known name of the RAUC service.
pub const DEFAULT_SERVICE: &str = "de.pengutronix.rauc";

/// Object path the installer interface lives on.
pub const DEFAULT_OBJECT_PATH: &str = "/";

/// Message bus an installer session connects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusType {
    /// Per-user session bus
    Session,
    /// System-wide bus
    System,
}

impl std::fmt::Display for BusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Session => write!(f, "session"),
            Self::System => write!(f, "system"),
        }
    }
}

/// Configured bus choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusSelection {
    /// Session bus when `DBUS_STARTER_BUS_TYPE=session`, system bus otherwise
    #[default]
    Auto,
    /// Always the session bus
    Session,
    /// Always the system bus
    System,
}

impl BusSelection {
    /// Resolve against the current process environment.
    #[must_use]
    pub fn resolve(self) -> BusType {
        self.resolve_with(std::env::var(STARTER_BUS_ENV).ok().as_deref())
    }

    /// Resolve against an explicit starter bus value.
    #[must_use]
    pub fn resolve_with(self, starter_bus: Option<&str>) -> BusType {
        match self {
            Self::Session => BusType::Session,
            Self::System => BusType::System,
            Self::Auto if starter_bus == Some("session") => BusType::Session,
            Self::Auto => BusType::System,
        }
    }
}

impl std::str::FromStr for BusSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(Self::Auto),
            "session" => Ok(Self::Session),
            "system" => Ok(Self::System),
            other => Err(Error::InvalidConfig {
                field: "installer.bus".to_string(),
                message: format!("unknown bus '{}', expected auto, session or system", other),
            }),
        }
    }
}

/// Installer configuration (exposed to TOML)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallerConfig {
    /// Which bus to connect to
    #[serde(default)]
    pub bus: BusSelection,
    /// Well-known bus name of the installer service
    #[serde(default = "default_service")]
    pub service: String,
    /// Object path of the installer interface
    #[serde(default = "default_object_path")]
    pub object_path: String,
}

fn default_service() -> String {
    DEFAULT_SERVICE.to_string()
}

fn default_object_path() -> String {
    DEFAULT_OBJECT_PATH.to_string()
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            bus: BusSelection::default(),
            service: default_service(),
            object_path: default_object_path(),
        }
    }
}

impl InstallerConfig {
    /// Check the values a session cannot work without.
    pub fn validate(&self) -> Result<()> {
        if self.service.is_empty() {
            return Err(Error::InvalidConfig {
                field: "installer.service".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if !self.object_path.starts_with('/') {
            return Err(Error::InvalidConfig {
                field: "installer.object_path".to_string(),
                message: "must start with '/'".to_string(),
            });
        }
        Ok(())
    }

    /// Endpoint a worker connects to, with the bus resolved from the environment.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            bus: self.bus.resolve(),
            service: self.service.clone(),
            object_path: self.object_path.clone(),
        }
    }
}

/// Fully resolved installer endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Bus to connect to
    pub bus: BusType,
    /// Well-known bus name of the installer service
    pub service: String,
    /// Object path of the installer interface
    pub object_path: String,
}

//! Install result codes.

use serde::{Deserialize, Serialize};

/// Result of an install operation as reported by the installer.
///
/// Negative values mean the operation has not finished yet. Zero is success and
/// any positive value is a terminal failure. Only a small closed set of codes is
/// produced locally; other non-negative values come from the remote service and
/// are passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultCode(i32);

impl ResultCode {
    /// Operation still running
    pub const PENDING: Self = Self(-1);
    /// Bundle installed
    pub const SUCCESS: Self = Self(0);
    /// Install failed, or the worker could not talk to the installer
    pub const FAILURE: Self = Self(1);
    /// The installer service went away mid-operation
    pub const DISCONNECTED: Self = Self(2);

    /// Wrap a raw code received from the installer.
    #[must_use]
    pub const fn from_raw(code: i32) -> Self {
        Self(code)
    }

    /// Raw integer value.
    #[must_use]
    pub const fn as_raw(self) -> i32 {
        self.0
    }

    /// Whether the operation has finished.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        self.0 >= 0
    }

    /// Whether the operation finished successfully.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl Default for ResultCode {
    fn default() -> Self {
        Self::PENDING
    }
}

impl From<i32> for ResultCode {
    fn from(code: i32) -> Self {
        Self::from_raw(code)
    }
}

impl std::fmt::Display for ResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::SUCCESS => write!(f, "success"),
            Self::FAILURE => write!(f, "failure"),
            Self::DISCONNECTED => write!(f, "disconnected"),
            code if !code.is_terminal() => write!(f, "pending ({})", code.0),
            code => write!(f, "failure ({})", code.0),
        }
    }
}

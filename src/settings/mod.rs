//! Application configuration types

use rauc_client_core::InstallerConfig;
use serde::{Deserialize, Serialize};

mod loader;

pub use loader::load_config;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub installer: InstallerConfig,
}

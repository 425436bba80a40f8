//! CLI module for rauc-client
//!
//! Provides commands:
//! - `install`: install a bundle and follow its progress

use clap::{Parser, Subcommand};
use std::process::ExitCode;

pub mod install;

/// RAUC installer client
#[derive(Parser, Debug)]
#[command(name = "rauc-client")]
#[command(about = "Install RAUC bundles and follow their progress")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install a bundle
    Install(install::InstallArgs),
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = crate::settings::load_config()?;

    match cli.command {
        Commands::Install(args) => install::run(args, config).await,
    }
}

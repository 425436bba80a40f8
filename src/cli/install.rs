//! `install` command

use crate::settings::AppConfig;
use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, ValueEnum};
use rauc_client_core::{
    format_error_for_cli, BusSelection, CompletionCallback, InstallContext, Installer, ResultCode,
    StatusCallback,
};
use rauc_client_dbus::DbusConnector;
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Path or URL of the bundle to install
    pub bundle: String,

    /// Bus to reach the installer on (overrides installer.bus)
    #[arg(long)]
    pub bus: Option<BusSelection>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain status lines
    Text,
    /// One JSON object per line
    Json,
}

/// One line of command output.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Report {
    Status {
        message: String,
        timestamp: DateTime<Utc>,
    },
    Completed {
        result: i32,
        outcome: String,
        timestamp: DateTime<Utc>,
    },
}

impl Report {
    fn status(message: String) -> Self {
        Self::Status {
            message,
            timestamp: Utc::now(),
        }
    }

    fn completed(result: ResultCode) -> Self {
        Self::Completed {
            result: result.as_raw(),
            outcome: result.to_string(),
            timestamp: Utc::now(),
        }
    }

    fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => serde_json::to_string(self).context("Failed to encode report"),
            OutputFormat::Text => Ok(match self {
                Self::Status { message, .. } => message.clone(),
                Self::Completed { outcome, .. } => format!("Installation finished: {}", outcome),
            }),
        }
    }
}

/// Process exit code for a terminal result.
fn exit_code(result: ResultCode) -> u8 {
    if result.is_success() {
        0
    } else {
        result.as_raw().clamp(1, 255) as u8
    }
}

/// Run the install command
pub async fn run(args: InstallArgs, mut config: AppConfig) -> Result<ExitCode> {
    if let Some(bus) = args.bus {
        config.installer.bus = bus;
    }
    config
        .installer
        .validate()
        .map_err(|e| anyhow!(format_error_for_cli(&e)))?;

    let (tx, mut rx) = mpsc::unbounded_channel();

    let status_tx = tx.clone();
    let on_status: StatusCallback = Arc::new(move |ctx: &InstallContext| {
        for message in ctx.drain_status() {
            let _ = status_tx.send(Report::status(message));
        }
    });
    let on_complete: CompletionCallback = Box::new(move |ctx: &InstallContext| {
        for message in ctx.drain_status() {
            let _ = tx.send(Report::status(message));
        }
        let _ = tx.send(Report::completed(ctx.result()));
    });

    let installer = Installer::new(Arc::new(DbusConnector::new()), config.installer);
    info!(bundle = %args.bundle, "Installing bundle");
    installer.start_install(&args.bundle, Some(on_status), Some(on_complete));

    while let Some(report) = rx.recv().await {
        println!("{}", report.render(args.format)?);
        if let Report::Completed { result, .. } = report {
            let result = ResultCode::from_raw(result);
            debug!(%result, "Install completed");
            return Ok(ExitCode::from(exit_code(result)));
        }
    }

    bail!("Install worker stopped without reporting a result")
}

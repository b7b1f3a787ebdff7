//! CLI for sitebackup.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use sitebackup_core::config;
use sitebackup_core::AdminCredential;
use std::path::PathBuf;
use std::time::Duration;

use commands::run_backup;

/// Environment variables holding secrets; cleared once parsed so child
/// processes and process inspection don't see them.
const SECRET_ENV_VARS: &[&str] = &["SECRET", "ADMIN_PASSWD"];

/// Top-level CLI for sitebackup.
#[derive(Debug, Parser)]
#[command(name = "sitebackup", version)]
#[command(about = "Trigger a remote site export and save it to a local file", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Export a site from the remote service into a local backup file.
    Backup(BackupArgs),
}

/// Flags for `backup`. Anything left unset falls back to config.toml.
#[derive(Debug, Clone, Args)]
pub struct BackupArgs {
    /// Export directory. Ignored when --file contains a path.
    #[arg(short = 'p', long = "path", env = "BACKUP_PATH", value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// File name template; supports {{.SITE}}, {{.TS}}, {{.YYYYMMDD}}, {{.YYYY}}, {{.YYYYMM}}, {{.YY}}, {{.MM}}, {{.DD}}.
    #[arg(short = 'f', long = "file", value_name = "TEMPLATE")]
    pub file: Option<String>,

    /// Site to export.
    #[arg(short = 's', long, env = "SITE")]
    pub site: Option<String>,

    /// Export timeout covering connect, response and download (e.g. 15m, 90s, 500ms).
    #[arg(long, value_parser = config::parse_duration)]
    pub timeout: Option<Duration>,

    /// Base URL of the remote service.
    #[arg(long, env = "REMOTE_URL")]
    pub url: Option<String>,

    /// Admin basic auth password.
    #[arg(long = "admin-passwd", env = "ADMIN_PASSWD", hide_env_values = true, value_parser = parse_credential)]
    pub admin_passwd: AdminCredential,
}

fn parse_credential(s: &str) -> std::result::Result<AdminCredential, String> {
    if s.is_empty() {
        return Err("admin password must not be empty".to_string());
    }
    Ok(AdminCredential::new(s))
}

impl Cli {
    /// Load config and dispatch. The environment must already be scrubbed.
    pub async fn run(self) -> Result<()> {
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match self.command {
            CliCommand::Backup(args) => run_backup(&cfg, args).await?,
        }

        Ok(())
    }
}

/// Remove secret variables from the process environment. Call before any
/// other thread exists; `remove_var` is not safe against concurrent readers.
pub fn scrub_secret_env() {
    for name in SECRET_ENV_VARS {
        if std::env::var_os(name).is_some() {
            std::env::remove_var(name);
            tracing::debug!("cleared {} from environment", name);
        }
    }
}

#[cfg(test)]
mod tests;

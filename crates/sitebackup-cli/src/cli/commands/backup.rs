//! `sitebackup backup` – resolve the destination, fetch the export, report.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sitebackup_core::config::SiteBackupConfig;
use sitebackup_core::export::{self, ExportRequest};
use sitebackup_core::filename;
use std::path::PathBuf;

use crate::cli::BackupArgs;

/// Flags merged over config.toml defaults.
#[derive(Debug)]
pub(crate) struct BackupPlan {
    pub destination: PathBuf,
    pub request: ExportRequest,
}

impl BackupPlan {
    /// Resolve the destination for `now`. Called once per run.
    pub(crate) fn build(cfg: &SiteBackupConfig, args: BackupArgs, now: DateTime<Utc>) -> Result<Self> {
        let export_path = args.path.unwrap_or_else(|| cfg.export_path.clone());
        let template = args.file.unwrap_or_else(|| cfg.file_template.clone());
        let site = args.site.unwrap_or_else(|| cfg.site.clone());
        let remote_url = args.url.unwrap_or_else(|| cfg.remote_url.clone());
        let timeout = match args.timeout {
            Some(t) => t,
            None => cfg.timeout()?,
        };

        tracing::info!("export to {}, site {}", export_path.display(), site);
        let destination = filename::resolve(&export_path, &template, &site, now)?;
        tracing::debug!("export file {}", destination.display());

        Ok(Self {
            destination,
            request: ExportRequest::new(remote_url, site, args.admin_passwd, timeout),
        })
    }
}

pub async fn run_backup(cfg: &SiteBackupConfig, args: BackupArgs) -> Result<()> {
    let BackupPlan {
        destination,
        request,
    } = BackupPlan::build(cfg, args, Utc::now())?;

    let result = tokio::task::spawn_blocking(move || export::fetch(&request, &destination))
        .await
        .context("export task failed")??;

    println!("Exported {} bytes to {}", result.bytes, result.path.display());
    Ok(())
}

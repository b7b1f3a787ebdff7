use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Defaults for `sitebackup backup`, loaded from `~/.config/sitebackup/config.toml`.
/// Command-line flags and environment variables override these.
///
/// The admin password is deliberately not a field: unknown keys are rejected,
/// so it can't be parked in this file by mistake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteBackupConfig {
    /// Directory the export is written to when the file template has no path.
    pub export_path: PathBuf,
    /// Filename template, e.g. `userbackup-{{.SITE}}-{{.TS}}.gz`.
    pub file_template: String,
    /// Site to export.
    pub site: String,
    /// Base URL of the remote service.
    pub remote_url: String,
    /// Export timeout, e.g. "15m", "90s", "500ms".
    pub timeout: String,
}

impl Default for SiteBackupConfig {
    fn default() -> Self {
        Self {
            export_path: PathBuf::from("./var/backup"),
            file_template: "userbackup-{{.SITE}}-{{.TS}}.gz".to_string(),
            site: "remark".to_string(),
            remote_url: "http://localhost:8080".to_string(),
            timeout: "15m".to_string(),
        }
    }
}

impl SiteBackupConfig {
    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(&self.timeout)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("invalid timeout in config: {:?}", self.timeout))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("sitebackup")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SiteBackupConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SiteBackupConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let cfg: SiteBackupConfig =
        toml::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(cfg)
}

/// Parse a duration like `15m`, `90s`, `500ms`, `2h`. A bare number means seconds.
/// Zero is rejected.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    let n: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration {:?}", s))?;
    let d = match unit.trim() {
        "" | "s" => Duration::from_secs(n),
        "ms" => Duration::from_millis(n),
        "m" => Duration::from_secs(n.saturating_mul(60)),
        "h" => Duration::from_secs(n.saturating_mul(3600)),
        other => return Err(format!("unknown duration unit {:?} in {:?}", other, s)),
    };
    if d.is_zero() {
        return Err("duration must be greater than zero".to_string());
    }
    Ok(d)
}

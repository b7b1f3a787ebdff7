//! Tests for the backup subcommand flags.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::Path;
use std::time::Duration;

#[test]
fn cli_parse_backup_long_flags() {
    match parse(&[
        "sitebackup",
        "backup",
        "--path",
        "/srv/backups",
        "--file",
        "userbackup-{{.SITE}}-{{.TS}}.gz",
        "--site",
        "blog",
        "--timeout",
        "90s",
        "--url",
        "https://comments.example.com",
        "--admin-passwd",
        "pw",
    ]) {
        CliCommand::Backup(args) => {
            assert_eq!(args.path.as_deref(), Some(Path::new("/srv/backups")));
            assert_eq!(args.file.as_deref(), Some("userbackup-{{.SITE}}-{{.TS}}.gz"));
            assert_eq!(args.site.as_deref(), Some("blog"));
            assert_eq!(args.timeout, Some(Duration::from_secs(90)));
            assert_eq!(args.url.as_deref(), Some("https://comments.example.com"));
        }
    }
}

#[test]
fn cli_parse_backup_short_flags() {
    match parse(&[
        "sitebackup",
        "backup",
        "-p",
        "out",
        "-f",
        "x.gz",
        "-s",
        "remark",
        "--admin-passwd",
        "pw",
    ]) {
        CliCommand::Backup(args) => {
            assert_eq!(args.path.as_deref(), Some(Path::new("out")));
            assert_eq!(args.file.as_deref(), Some("x.gz"));
            assert_eq!(args.site.as_deref(), Some("remark"));
        }
    }
}

#[test]
fn cli_parse_backup_timeout_units() {
    match parse(&["sitebackup", "backup", "--timeout", "50ms", "--admin-passwd", "pw"]) {
        CliCommand::Backup(args) => assert_eq!(args.timeout, Some(Duration::from_millis(50))),
    }
}

#[test]
fn cli_rejects_bad_timeout() {
    assert!(Cli::try_parse_from([
        "sitebackup",
        "backup",
        "--timeout",
        "forever",
        "--admin-passwd",
        "pw"
    ])
    .is_err());
    assert!(Cli::try_parse_from([
        "sitebackup",
        "backup",
        "--timeout",
        "0s",
        "--admin-passwd",
        "pw"
    ])
    .is_err());
}

#[test]
fn cli_rejects_empty_password() {
    assert!(Cli::try_parse_from(["sitebackup", "backup", "--admin-passwd", ""]).is_err());
}

#[test]
fn cli_debug_output_hides_password() {
    let cli = Cli::try_parse_from(["sitebackup", "backup", "--admin-passwd", "hunter2"]).unwrap();
    assert!(!format!("{:?}", cli).contains("hunter2"));
}

#[test]
fn scrub_secret_env_clears_shared_secret() {
    // Only SECRET is touched; parse tests read ADMIN_PASSWD through clap.
    std::env::set_var("SECRET", "hunter2");
    crate::cli::scrub_secret_env();
    assert!(std::env::var_os("SECRET").is_none());
}

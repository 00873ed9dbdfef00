//! Tests for plan, config and global options.

use super::parse;
use crate::cli::{Cli, CliCommand};
use cbackup_core::config::BackupConfig;
use clap::Parser;
use std::path::{Path, PathBuf};

#[test]
fn cli_parse_plan() {
    match parse(&[
        "cbackup",
        "plan",
        "course.json",
        "--resolution",
        "480",
        "--subtitles",
    ]) {
        CliCommand::Plan { files, select } => {
            assert_eq!(files, vec![PathBuf::from("course.json")]);
            assert_eq!(select.resolution, Some(480));
            assert!(select.subtitles);
            assert!(select.dir.is_none());
        }
        _ => panic!("expected Plan"),
    }
}

#[test]
fn cli_plan_rejects_backup_only_flags() {
    assert!(Cli::try_parse_from(["cbackup", "plan", "c.json", "--restart"]).is_err());
}

#[test]
fn cli_parse_config() {
    assert!(matches!(parse(&["cbackup", "config"]), CliCommand::Config));
}

#[test]
fn cli_parse_global_config_path() {
    let cli = Cli::try_parse_from(["cbackup", "plan", "c.json", "--config", "/tmp/c.toml"]).unwrap();
    assert_eq!(cli.config.as_deref(), Some(Path::new("/tmp/c.toml")));

    let cli = Cli::try_parse_from(["cbackup", "--config", "x.toml", "config"]).unwrap();
    assert_eq!(cli.config.as_deref(), Some(Path::new("x.toml")));
}

#[test]
fn plan_overrides_only_touch_selection() {
    let mut cfg = BackupConfig::default();
    let workers = cfg.workers;
    parse(&["cbackup", "plan", "c.json", "--dir", "/mirror", "--subtitles"])
        .apply_overrides(&mut cfg);
    assert_eq!(cfg.output_dir, PathBuf::from("/mirror"));
    assert!(cfg.subtitles);
    assert_eq!(cfg.workers, workers);
    assert!(!cfg.restart);
}

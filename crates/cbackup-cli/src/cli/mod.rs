//! CLI for cbackup.

mod commands;

use anyhow::Result;
use cbackup_core::config::{self, BackupConfig, RetryConfig};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_backup, run_plan, run_show_config};

/// Top-level CLI for cbackup.
#[derive(Debug, Parser)]
#[command(name = "cbackup")]
#[command(about = "cbackup: mirror online courses into a local directory tree", long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the XDG default.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Options shared by `backup` and `plan`. Unset flags keep the config file values.
#[derive(Debug, Clone, Default, Args)]
pub struct SelectArgs {
    /// Root directory of the mirrored tree.
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Preferred video resolution (e.g. 720). 0 picks the highest available.
    #[arg(long, value_name = "N")]
    pub resolution: Option<u32>,

    /// Also download caption files.
    #[arg(long)]
    pub subtitles: bool,
}

impl SelectArgs {
    fn apply(&self, cfg: &mut BackupConfig) {
        if let Some(dir) = &self.dir {
            cfg.output_dir = dir.clone();
        }
        if let Some(resolution) = self.resolution {
            cfg.resolution = resolution;
        }
        if self.subtitles {
            cfg.subtitles = true;
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download every course in the given course files.
    Backup {
        /// JSON course export(s) to mirror.
        #[arg(required = true, value_name = "COURSE_FILE")]
        files: Vec<PathBuf>,

        #[command(flatten)]
        select: SelectArgs,

        /// Number of concurrent downloads.
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,

        /// Extra attempts per file after the first one fails.
        #[arg(long, value_name = "N")]
        retries: Option<u32>,

        /// Resume: skip files that already exist at their destination.
        #[arg(long)]
        restart: bool,
    },

    /// Show the directories and files a backup would create, without touching disk.
    Plan {
        /// JSON course export(s) to plan.
        #[arg(required = true, value_name = "COURSE_FILE")]
        files: Vec<PathBuf>,

        #[command(flatten)]
        select: SelectArgs,
    },

    /// Print the config file location and the effective settings.
    Config,
}

impl CliCommand {
    /// Fold command-line overrides into the loaded config.
    pub fn apply_overrides(&self, cfg: &mut BackupConfig) {
        match self {
            CliCommand::Backup {
                select,
                concurrency,
                retries,
                restart,
                ..
            } => {
                select.apply(cfg);
                if let Some(n) = concurrency {
                    cfg.workers = *n;
                }
                if let Some(n) = retries {
                    cfg.retry = Some(RetryConfig {
                        retry_count: *n,
                        ..cfg.retry_config()
                    });
                }
                if *restart {
                    cfg.restart = true;
                }
            }
            CliCommand::Plan { select, .. } => select.apply(cfg),
            CliCommand::Config => {}
        }
    }

    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let (cfg_path, mut cfg) = match &cli.config {
            Some(path) => (path.clone(), config::load_from_path(path)?),
            None => (config::config_path()?, config::load_or_init()?),
        };
        cli.command.apply_overrides(&mut cfg);
        tracing::debug!("effective config: {:?}", cfg);

        match cli.command {
            CliCommand::Backup { files, .. } => run_backup(&cfg, &files)?,
            CliCommand::Plan { files, .. } => run_plan(&cfg, &files)?,
            CliCommand::Config => run_show_config(&cfg_path, &cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;

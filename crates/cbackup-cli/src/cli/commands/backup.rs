//! `cbackup backup` – mirror courses to disk.

use anyhow::{Context, Result};
use cbackup_core::backup::BackupJob;
use cbackup_core::cancel::CancelToken;
use cbackup_core::config::BackupConfig;
use cbackup_core::executor::FsExecutor;
use cbackup_core::fetch::CurlFetcher;
use std::path::PathBuf;
use std::time::Instant;

use super::load_courses;

pub fn run_backup(cfg: &BackupConfig, files: &[PathBuf]) -> Result<()> {
    let courses = load_courses(files)?;
    let run = cfg.run_config();

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        if on_interrupt.cancel() {
            eprintln!("\ninterrupted, waiting for in-flight downloads to finish");
        }
    }) {
        tracing::warn!("could not install Ctrl-C handler: {}", e);
    }

    println!(
        "Backing up {} course(s) to {} with {} worker(s)",
        courses.len(),
        run.output_dir.display(),
        run.workers
    );

    let executor = FsExecutor::new(CurlFetcher::from_config(&cfg.http), run.restart);
    let job = BackupJob::new(run, cfg.retry_policy()).with_cancel(cancel);
    let started = Instant::now();
    let summary = job.run(&courses, &executor).context("backup failed")?;

    println!(
        "Done in {:.1}s: {} downloaded ({:.1} MiB), {} written, {} skipped, {} retried attempt(s)",
        started.elapsed().as_secs_f64(),
        summary.downloaded,
        summary.bytes as f64 / 1_048_576.0,
        summary.written,
        summary.skipped,
        summary.retried_attempts
    );
    tracing::info!(?summary, "backup finished");
    Ok(())
}

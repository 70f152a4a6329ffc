// src/job/sweeper.rs

//! Retention sweeper for job working directories.
//!
//! Finished jobs keep their directories so that callers (and operators) can
//! inspect simulator output files afterwards. This sweeper deletes those
//! directories once they are older than the retention period.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::Context;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::job::active::ActiveJobs;
use crate::job::workdir::JOB_DIR_PREFIX;

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: Vec<PathBuf>,
    pub kept: usize,
    pub failed: usize,
}

/// Remove every job directory under `root` last modified more than
/// `retention` ago. Entries that are not job directories, and directories of
/// jobs in `active`, are never touched.
pub async fn sweep_once(
    root: &Path,
    retention: Duration,
    active: &ActiveJobs,
) -> Result<SweepReport> {
    let mut report = SweepReport::default();

    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(report),
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("reading job root {:?}", root))
                .into());
        }
    };

    let now = SystemTime::now();
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("listing job root {:?}", root))?
    {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(JOB_DIR_PREFIX) {
            continue;
        }

        let path = entry.path();
        if active.contains(&path) {
            report.kept += 1;
            continue;
        }
        let metadata = match entry.metadata().await {
            Ok(m) if m.is_dir() => m,
            Ok(_) => continue,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot stat job directory");
                report.failed += 1;
                continue;
            }
        };

        let age = metadata
            .modified()
            .ok()
            .and_then(|mtime| now.duration_since(mtime).ok())
            .unwrap_or_default();
        if age < retention {
            report.kept += 1;
            continue;
        }

        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), age_secs = age.as_secs(), "removed stale job directory");
                report.removed.push(path);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove stale job directory");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Run [`sweep_once`] every `interval` until the returned task is aborted.
pub fn spawn_sweeper(
    root: PathBuf,
    retention: Duration,
    interval: Duration,
    active: ActiveJobs,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            root = %root.display(),
            retention_secs = retention.as_secs(),
            interval_secs = interval.as_secs(),
            "job directory sweeper started"
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match sweep_once(&root, retention, &active).await {
                Ok(report) if !report.removed.is_empty() || report.failed > 0 => info!(
                    removed = report.removed.len(),
                    kept = report.kept,
                    failed = report.failed,
                    "swept job directories"
                ),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "job directory sweep failed"),
            }
        }
    })
}

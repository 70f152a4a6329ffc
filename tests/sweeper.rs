mod common;
use crate::common::stub::job_dirs;
use crate::common::{TestResult, init_tracing, with_timeout};

use std::time::Duration;

use spiceserver::job::workdir::create_job_dir;
use spiceserver::job::{ActiveJobs, InputFile, JobInput, spawn_sweeper, sweep_once};
use spiceserver::types::Flavour;
use tempfile::TempDir;

use crate::common::builders::shell_job_manager;

#[tokio::test]
async fn expired_job_dirs_are_removed_and_others_untouched() -> TestResult {
    init_tracing();
    let root = TempDir::new()?;
    let a = create_job_dir(root.path())?;
    let b = create_job_dir(root.path())?;
    std::fs::write(a.join("out.raw"), "data")?;
    std::fs::create_dir(root.path().join("unrelated"))?;
    std::fs::write(root.path().join("spice_server.file"), "not a dir")?;

    tokio::time::sleep(Duration::from_millis(20)).await;
    let report = sweep_once(root.path(), Duration::from_millis(1), &ActiveJobs::new()).await?;

    let mut removed = report.removed.clone();
    removed.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(removed, expected);
    assert_eq!(report.failed, 0);
    assert!(job_dirs(root.path()).is_empty());
    assert!(root.path().join("unrelated").is_dir());
    assert!(root.path().join("spice_server.file").is_file());
    Ok(())
}

#[tokio::test]
async fn fresh_job_dirs_are_kept() -> TestResult {
    init_tracing();
    let root = TempDir::new()?;
    let dir = create_job_dir(root.path())?;

    let report = sweep_once(root.path(), Duration::from_secs(3600), &ActiveJobs::new()).await?;

    assert!(report.removed.is_empty());
    assert_eq!(report.kept, 1);
    assert!(dir.is_dir());
    Ok(())
}

#[tokio::test]
async fn missing_root_is_an_empty_sweep() -> TestResult {
    init_tracing();
    let root = TempDir::new()?;

    let report = sweep_once(
        &root.path().join("never-created"),
        Duration::from_secs(1),
        &ActiveJobs::new(),
    )
    .await?;

    assert_eq!(report, Default::default());
    Ok(())
}

#[tokio::test]
async fn background_sweeper_cleans_up_periodically() -> TestResult {
    init_tracing();
    let root = TempDir::new()?;
    create_job_dir(root.path())?;

    let handle = spawn_sweeper(
        root.path().to_path_buf(),
        Duration::from_millis(1),
        Duration::from_millis(50),
        ActiveJobs::new(),
    );

    with_timeout(async {
        while !job_dirs(root.path()).is_empty() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;

    handle.abort();
    Ok(())
}

#[tokio::test]
async fn tracked_dirs_survive_until_released() -> TestResult {
    init_tracing();
    let root = TempDir::new()?;
    let dir = create_job_dir(root.path())?;
    let active = ActiveJobs::new();
    let guard = active.track(dir.clone());

    tokio::time::sleep(Duration::from_millis(20)).await;
    let report = sweep_once(root.path(), Duration::from_millis(1), &active).await?;
    assert!(report.removed.is_empty());
    assert_eq!(report.kept, 1);
    assert!(dir.is_dir());

    drop(guard);
    assert!(active.is_empty());
    let report = sweep_once(root.path(), Duration::from_millis(1), &active).await?;
    assert_eq!(report.removed, vec![dir.clone()]);
    assert!(!dir.exists());
    Ok(())
}

#[tokio::test]
async fn running_job_dir_is_not_swept() -> TestResult {
    init_tracing();
    let root = TempDir::new()?;
    let jobs = shell_job_manager(root.path());
    let input = JobInput::Verbatim(vec![InputFile::new("run.sh", b"exec sleep 30\n")]);

    let job = jobs.run_job(Flavour::Ngspice, input, Vec::new()).await?;
    let dir = job.working_dir().to_path_buf();
    assert!(jobs.active_jobs().contains(&dir));

    tokio::time::sleep(Duration::from_millis(20)).await;
    let report = sweep_once(root.path(), Duration::from_millis(1), jobs.active_jobs()).await?;
    assert!(report.removed.is_empty());
    assert!(dir.is_dir());

    with_timeout(job.cancel()).await;
    assert!(jobs.active_jobs().is_empty());
    assert!(!dir.exists());
    Ok(())
}

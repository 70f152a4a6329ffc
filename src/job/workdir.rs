// src/job/workdir.rs

//! Job working directories: creation, input validation and materialisation.

use std::io;
use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use nix::errno::Errno;
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::errors::{Result, SpiceError};
use crate::job::InputFile;

/// Every job directory is named `<root>/<JOB_DIR_PREFIX><random>`.
pub const JOB_DIR_PREFIX: &str = "spice_server.";

const RANDOM_SUFFIX_LEN: usize = 12;

/// Check that `raw` names a file strictly inside the job directory.
///
/// Rejects empty paths, absolute paths, any `..` component, and paths that
/// name no file at all (`"."`, `"dir/"`).
pub fn validate_relative_path(raw: &str) -> Result<PathBuf> {
    if raw.is_empty() {
        return Err(SpiceError::InvalidArgument("input file path is empty".into()));
    }
    if raw.contains('\0') {
        return Err(SpiceError::InvalidArgument(format!(
            "input file path {raw:?} contains a NUL byte"
        )));
    }
    if raw.ends_with('/') {
        return Err(SpiceError::InvalidArgument(format!(
            "input file path {raw:?} names a directory"
        )));
    }

    let path = Path::new(raw);
    let mut names_file = false;
    for component in path.components() {
        match component {
            Component::Normal(_) => names_file = true,
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(SpiceError::InvalidArgument(format!(
                    "input file path {raw:?} must not contain '..'"
                )));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(SpiceError::InvalidArgument(format!(
                    "input file path {raw:?} must be relative"
                )));
            }
        }
    }
    if !names_file {
        return Err(SpiceError::InvalidArgument(format!(
            "input file path {raw:?} does not name a file"
        )));
    }

    Ok(path.to_path_buf())
}

/// Validate every path up front so that nothing is written if any is unsafe.
pub fn validate_input_files(files: &[InputFile]) -> Result<Vec<PathBuf>> {
    if files.is_empty() {
        return Err(SpiceError::InvalidArgument("no input files given".into()));
    }
    files
        .iter()
        .map(|file| validate_relative_path(&file.relative_path))
        .collect()
}

/// Create a fresh, uniquely named directory under `root`. Creation is atomic
/// and retried on name collision, so concurrent callers never share a
/// directory.
///
/// The directory is removed when the returned handle drops; call
/// [`TempDir::keep`] once the job owning it has started.
pub fn new_job_dir(root: &Path) -> Result<TempDir> {
    std::fs::create_dir_all(root).map_err(|e| dir_error(root, e))?;

    let dir = tempfile::Builder::new()
        .prefix(JOB_DIR_PREFIX)
        .rand_bytes(RANDOM_SUFFIX_LEN)
        .tempdir_in(root)
        .map_err(|e| dir_error(root, e))?;

    debug!(job_dir = %dir.path().display(), "created job directory");
    Ok(dir)
}

/// Like [`new_job_dir`], but the directory outlives this process.
pub fn create_job_dir(root: &Path) -> Result<PathBuf> {
    Ok(new_job_dir(root)?.keep())
}

/// Write each file to `dir/relative_path`, creating parent directories.
///
/// `relative_paths` must come from [`validate_input_files`] for `files`.
pub async fn materialize_inputs(
    dir: &Path,
    files: &[InputFile],
    relative_paths: &[PathBuf],
) -> Result<()> {
    for (file, relative) in files.iter().zip(relative_paths) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating dir {:?}", parent))?;
        }
        debug!(path = %path.display(), bytes = file.content.len(), "writing input file");
        tokio::fs::write(&path, &file.content)
            .await
            .with_context(|| format!("writing input file {:?}", path))?;
    }
    Ok(())
}

/// Best-effort recursive delete, used when a job is abandoned.
pub async fn remove_job_dir(dir: &Path) {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => debug!(job_dir = %dir.display(), "removed job directory"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(job_dir = %dir.display(), error = %e, "failed to remove job directory"),
    }
}

fn dir_error(root: &Path, err: io::Error) -> SpiceError {
    let message = format!("creating job directory under {}: {err}", root.display());
    let exhausted = err.raw_os_error().is_some_and(|code| {
        matches!(
            Errno::from_raw(code),
            Errno::ENOSPC | Errno::EDQUOT | Errno::EMFILE | Errno::ENFILE
        )
    });
    if exhausted {
        SpiceError::ResourceExhausted(message)
    } else {
        SpiceError::Internal(message)
    }
}

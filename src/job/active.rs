// src/job/active.rs

//! Working directories of jobs that have not finished yet.
//!
//! The sweeper consults this set so it never deletes a directory out from
//! under a long-running simulation, whatever its mtime says.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct ActiveJobs {
    dirs: Arc<Mutex<HashSet<PathBuf>>>,
}

impl ActiveJobs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `dir` live until the returned guard is dropped.
    pub fn track(&self, dir: PathBuf) -> ActiveGuard {
        debug!(job_dir = %dir.display(), "job directory in use");
        self.lock().insert(dir.clone());
        ActiveGuard {
            jobs: self.clone(),
            dir,
        }
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.lock().contains(dir)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        self.dirs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps one directory in [`ActiveJobs`] for as long as it lives.
#[derive(Debug)]
pub struct ActiveGuard {
    jobs: ActiveJobs,
    dir: PathBuf,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.jobs.lock().remove(&self.dir);
    }
}

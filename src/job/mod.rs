// src/job/mod.rs

//! Simulation jobs.
//!
//! - [`manager`] resolves a flavour, prepares a working directory and spawns
//!   the simulator, handing back a [`Job`].
//! - [`workdir`] owns working-directory naming, input path validation and
//!   writing inputs to disk.
//! - [`sweeper`] deletes stale job directories. Nothing else ever removes a
//!   finished job's directory, so production deployments must run it (or an
//!   equivalent external TTL cleaner).
//! - [`active`] tracks directories of unfinished jobs so the sweeper skips
//!   them.

pub mod active;
pub mod manager;
pub mod sweeper;
pub mod workdir;

pub use active::{ActiveGuard, ActiveJobs};
pub use manager::{Job, JobManager, JobSettings};
pub use sweeper::{SweepReport, spawn_sweeper, sweep_once};

/// One file supplied verbatim by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    /// Relative to the job's working directory.
    pub relative_path: String,
    pub content: Vec<u8>,
}

impl InputFile {
    pub fn new(relative_path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            relative_path: relative_path.into(),
            content: content.into(),
        }
    }
}

/// A structured circuit description that must go through the netlister
/// before a simulator can read it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructuredInput {
    pub format: String,
    pub payload: Vec<u8>,
}

/// What the simulator will run on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobInput {
    /// Files written as-is; the first one is the top-level input.
    Verbatim(Vec<InputFile>),
    /// Converted by the netlister; its first generated file is the top-level
    /// input.
    Structured(StructuredInput),
}

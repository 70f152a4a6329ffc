// src/exec/mod.rs

//! Process execution layer.
//!
//! [`runner`] owns one child process at a time: spawning it with piped
//! stdout/stderr, multiplexing the two pipes with bounded-latency polling,
//! reaping it and turning the OS wait status into an [`ExitStatus`].
//!
//! [`ExitStatus`]: crate::types::ExitStatus

pub mod runner;

pub use runner::{
    CHUNK_SIZE, DEFAULT_POLL_INTERVAL, EXEC_FAILURE_EXIT_CODE, PartialOutputLoss, ProcessRunner,
    RunnerState,
};

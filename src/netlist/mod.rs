// src/netlist/mod.rs

//! Structured input → simulator netlist conversion.
//!
//! Netlisting is always done out of process. The server talks to a
//! [`Netlister`]; production uses [`CommandNetlister`], which runs an external
//! tool through the same [`crate::exec::ProcessRunner`] used for simulators.
//! Tests can plug in their own implementation.

pub mod command;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use crate::job::StructuredInput;
use crate::types::Flavour;

pub use command::CommandNetlister;

/// Converts structured input into simulator input files.
pub trait Netlister: Send + Sync {
    /// Write netlists for `input` in `flavour`'s dialect into `output_dir`.
    ///
    /// Returns the generated files, top-level file first. Paths may be
    /// absolute or relative to `output_dir`. An empty list means conversion
    /// failed.
    fn write_sim<'a>(
        &'a self,
        input: &'a StructuredInput,
        flavour: Flavour,
        output_dir: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Vec<PathBuf>> + Send + 'a>>;
}

// src/registry/probe.rs

//! Search-path probing for well-known simulator executables.

use std::ffi::OsStr;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use tracing::debug;

use crate::registry::Descriptor;
use crate::types::Flavour;

/// A simulator we know how to find by executable name.
#[derive(Debug, Clone, Copy)]
pub struct KnownSimulator {
    pub executable: &'static str,
    pub display_name: &'static str,
    pub license: &'static str,
    pub flavour: Flavour,
}

/// Probed at startup, in this order.
pub const KNOWN_SIMULATORS: [KnownSimulator; 4] = [
    KnownSimulator {
        executable: "ngspice",
        display_name: "ngspice",
        license: "BSD 3-Clause",
        flavour: Flavour::Ngspice,
    },
    KnownSimulator {
        executable: "Xyce",
        display_name: "Xyce",
        license: "GPL",
        flavour: Flavour::Xyce,
    },
    KnownSimulator {
        executable: "hspice",
        display_name: "HSPICE",
        license: "Proprietary",
        flavour: Flavour::Hspice,
    },
    KnownSimulator {
        executable: "spectre",
        display_name: "Spectre",
        license: "Proprietary",
        flavour: Flavour::Spectre,
    },
];

/// Find the first regular file called `name` with any execute bit set,
/// searching the directories of `search_path` (a `$PATH`-style list) in order.
pub fn find_executable_in_path(name: &str, search_path: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable_file(candidate))
}

fn is_executable_file(path: &std::path::Path) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

/// Probe every [`KNOWN_SIMULATORS`] entry against `search_path`.
///
/// Simulators that are not found are simply absent from the result.
pub fn probe_known_simulators(search_path: &OsStr) -> Vec<Descriptor> {
    KNOWN_SIMULATORS
        .iter()
        .filter_map(|known| {
            let path = find_executable_in_path(known.executable, search_path);
            debug!(executable = known.executable, found = ?path, "probed search path");
            path.map(|path| {
                Descriptor::new(
                    path,
                    "unknown",
                    known.display_name,
                    known.license,
                    [known.flavour],
                )
            })
        })
        .collect()
}

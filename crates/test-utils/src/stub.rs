//! Stand-in simulators.
//!
//! Most tests register `/bin/sh` as the simulator and send a shell script as
//! the top-level input file, so the "simulator" runs `sh <input> [args...]`.
//! Nothing has to be made executable, which keeps concurrently running tests
//! clear of `ETXTBSY` races.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use spiceserver::registry::{Descriptor, Registry};
use spiceserver::types::Flavour;

/// Interpreter used as the stub simulator binary.
pub const SHELL: &str = "/bin/sh";

/// Descriptor that runs `/bin/sh` for every flavour in `flavours`.
pub fn shell_descriptor(flavours: impl IntoIterator<Item = Flavour>) -> Descriptor {
    Descriptor::new(SHELL, "1.0", "stub-sim", "MIT", flavours)
}

/// Registry where NGSPICE and XYCE both run the shell stub.
pub fn shell_registry() -> Registry {
    let registry = Registry::new();
    registry.register_descriptor(shell_descriptor([Flavour::Ngspice]));
    registry.register_descriptor(shell_descriptor([Flavour::Xyce]));
    registry
}

/// Write a plain file (no execute bits) and return its path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(&path, contents).expect("write file");
    path
}

/// Write `#!/bin/sh` + `body` and mark it executable.
///
/// Only use this for files that are probed, not executed, while other
/// tests may be forking.
pub fn write_executable(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = write_file(dir, name, &format!("#!/bin/sh\n{body}\n"));
    let mut perms = fs::metadata(&path).expect("stat stub").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod stub");
    path
}

/// Names of the job directories currently under `root`.
pub fn job_dirs(root: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(root)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.is_dir()
                        && p.file_name()
                            .is_some_and(|n| n.to_string_lossy().starts_with("spice_server."))
                })
                .collect()
        })
        .unwrap_or_default();
    dirs.sort();
    dirs
}

mod common;
use crate::common::builders::ConfigFileBuilder;
use crate::common::init_tracing;
use crate::common::stub::{write_executable, write_file};

use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

use spiceserver::registry::{Descriptor, Registry, find_executable_in_path, probe_known_simulators};
use spiceserver::types::Flavour;
use tempfile::TempDir;

fn search_path(dirs: &[&Path]) -> OsString {
    std::env::join_paths(dirs).expect("join search path")
}

#[test]
fn three_aliases_share_one_descriptor() {
    init_tracing();
    let registry = Registry::new();
    let descriptor = registry.register_descriptor(Descriptor::new(
        "/opt/xyce/bin/Xyce",
        "7.8",
        "Xyce",
        "GPL",
        [Flavour::Xyce, Flavour::Xyce78, Flavour::Xyce79],
    ));

    let found: Vec<_> = [Flavour::Xyce, Flavour::Xyce78, Flavour::Xyce79]
        .into_iter()
        .map(|f| registry.get_descriptor(f).expect("alias registered"))
        .collect();

    for d in &found {
        assert!(Arc::ptr_eq(d, &descriptor));
        assert_eq!(d.executable_path, Path::new("/opt/xyce/bin/Xyce"));
        assert_eq!(d.version, "7.8");
    }
    assert_eq!(registry.len(), 3);
    assert!(registry.get_descriptor(Flavour::Xyce710).is_none());
    assert!(!registry.is_registered(Flavour::Ngspice));
}

#[test]
fn get_all_descriptors_is_ordered_by_flavour() {
    init_tracing();
    let registry = Registry::new();
    registry.register_descriptor(Descriptor::new("/bin/x", "1", "x", "", [Flavour::Xyce710]));
    registry.register_descriptor(Descriptor::new("/bin/n", "1", "n", "", [Flavour::Ngspice]));

    let flavours: Vec<Flavour> = registry
        .get_all_descriptors()
        .into_iter()
        .map(|(f, _)| f)
        .collect();

    assert_eq!(flavours, vec![Flavour::Ngspice, Flavour::Xyce710]);
}

#[test]
fn register_replaces_previous_entry() {
    init_tracing();
    let registry = Registry::new();
    registry.register(
        Flavour::Ngspice,
        Arc::new(Descriptor::new("/old/ngspice", "40", "ngspice", "", [Flavour::Ngspice])),
    );
    registry.register(
        Flavour::Ngspice,
        Arc::new(Descriptor::new("/new/ngspice", "42", "ngspice", "", [Flavour::Ngspice])),
    );

    let d = registry.get_descriptor(Flavour::Ngspice).unwrap();
    assert_eq!(d.executable_path, Path::new("/new/ngspice"));
    assert_eq!(registry.len(), 1);
}

#[test]
fn probing_finds_executables_in_search_order() {
    init_tracing();
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    write_executable(second.path(), "ngspice", "exit 0");
    write_executable(first.path(), "Xyce", "exit 0");
    write_executable(second.path(), "Xyce", "exit 0");

    let path = search_path(&[first.path(), second.path()]);
    let registry = Registry::probed(&path);

    let ngspice = registry.get_descriptor(Flavour::Ngspice).unwrap();
    assert_eq!(ngspice.executable_path, second.path().join("ngspice"));
    assert_eq!(ngspice.display_name, "ngspice");

    let xyce = registry.get_descriptor(Flavour::Xyce).unwrap();
    assert_eq!(xyce.executable_path, first.path().join("Xyce"));

    assert!(!registry.is_registered(Flavour::Hspice));
    assert!(!registry.is_registered(Flavour::Spectre));
    // Version-specific aliases only come from static config.
    assert!(!registry.is_registered(Flavour::Xyce78));
}

#[test]
fn probing_ignores_non_executables_and_directories() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "hspice", "not executable");
    std::fs::create_dir(dir.path().join("spectre")).unwrap();

    let path = search_path(&[dir.path()]);

    assert!(find_executable_in_path("hspice", &path).is_none());
    assert!(find_executable_in_path("spectre", &path).is_none());
    assert!(probe_known_simulators(&path).is_empty());
}

#[test]
fn probing_an_empty_search_path_finds_nothing() {
    init_tracing();
    let registry = Registry::probed(&OsString::new());
    assert!(registry.is_empty());
    assert!(registry.report_installed().is_empty());
}

#[test]
fn static_installs_override_probed_entries() {
    init_tracing();
    let bin = TempDir::new().unwrap();
    write_executable(bin.path(), "Xyce", "exit 0");
    let registry = Registry::probed(&search_path(&[bin.path()]));

    let cfg = ConfigFileBuilder::new()
        .with_simulator(
            "Xyce",
            Path::new("/opt/xyce/7.8/bin/Xyce"),
            &[Flavour::Xyce, Flavour::Xyce78],
        )
        .build();
    registry.merge_static(&cfg.simulator);

    let xyce = registry.get_descriptor(Flavour::Xyce).unwrap();
    let xyce78 = registry.get_descriptor(Flavour::Xyce78).unwrap();
    assert_eq!(xyce.executable_path, Path::new("/opt/xyce/7.8/bin/Xyce"));
    assert!(Arc::ptr_eq(&xyce, &xyce78));
    assert_eq!(
        xyce.aliases.iter().copied().collect::<Vec<_>>(),
        vec![Flavour::Xyce, Flavour::Xyce78]
    );
}

#[test]
fn report_lists_every_registration() {
    init_tracing();
    let registry = Registry::new();
    registry.register_descriptor(Descriptor::new(
        "/opt/xyce/bin/Xyce",
        "7.8",
        "Xyce",
        "GPL",
        [Flavour::Xyce, Flavour::Xyce78],
    ));
    registry.register_descriptor(Descriptor::new(
        "/usr/bin/ngspice",
        "42",
        "ngspice",
        "",
        [Flavour::Ngspice],
    ));

    let report = registry.report_installed();

    assert!(report.contains("[NGSPICE] Simulator: ngspice Version: 42"));
    assert!(report.contains("[XYCE] Simulator: Xyce Version: 7.8"));
    assert!(report.contains("[XYCE_7_8] Simulator: Xyce Version: 7.8"));
    assert!(report.contains("Path: /opt/xyce/bin/Xyce"));
    assert!(report.contains("License: GPL"));
    assert_eq!(report.matches("License:").count(), 2);
}

#[test]
fn concurrent_readers_see_complete_descriptors() {
    init_tracing();
    let registry = Arc::new(Registry::new());
    let mut handles = Vec::new();

    for i in 0..4 {
        let registry = Arc::clone(&registry);
        handles.push(std::thread::spawn(move || {
            for n in 0..200 {
                if i == 0 {
                    registry.register_descriptor(Descriptor::new(
                        format!("/bin/sim-{n}"),
                        n.to_string(),
                        "sim",
                        "",
                        [Flavour::Ngspice, Flavour::Xyce],
                    ));
                } else if let Some(d) = registry.get_descriptor(Flavour::Ngspice) {
                    assert_eq!(d.executable_path, Path::new(&format!("/bin/sim-{}", d.version)));
                }
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(registry.len(), 2);
}

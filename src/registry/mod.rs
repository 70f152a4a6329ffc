// src/registry/mod.rs

//! Flavour → installed simulator lookup.
//!
//! The map is read on every request and written only at startup (probing and
//! static config) or by explicit registration, so it sits behind a
//! `std::sync::RwLock`. Readers take the shared lock just long enough to clone
//! an `Arc<Descriptor>`; a writer swaps whole `Arc`s in under the exclusive
//! lock, so no reader ever sees a partially built descriptor.

pub mod descriptor;
pub mod probe;

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fmt::Write as _;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::config::StaticInstall;
use crate::types::Flavour;

pub use descriptor::Descriptor;
pub use probe::{KNOWN_SIMULATORS, find_executable_in_path, probe_known_simulators};

#[derive(Debug, Default)]
pub struct Registry {
    simulators: RwLock<BTreeMap<Flavour, Arc<Descriptor>>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated by probing `search_path` for the well-known
    /// simulators.
    pub fn probed(search_path: &OsStr) -> Self {
        let registry = Self::new();
        info!("searching for known simulators in search path");
        for descriptor in probe_known_simulators(search_path) {
            registry.register_descriptor(descriptor);
        }
        registry
    }

    /// Register `descriptor` under one flavour, replacing any previous entry.
    pub fn register(&self, flavour: Flavour, descriptor: Arc<Descriptor>) {
        debug!(
            %flavour,
            path = %descriptor.executable_path.display(),
            "registering simulator"
        );
        self.write().insert(flavour, descriptor);
    }

    /// Register `descriptor` under every one of its aliases. All aliases share
    /// one `Arc`.
    pub fn register_descriptor(&self, descriptor: Descriptor) -> Arc<Descriptor> {
        let descriptor = Arc::new(descriptor);
        let mut map = self.write();
        for flavour in descriptor.aliases.iter().copied() {
            debug!(
                %flavour,
                path = %descriptor.executable_path.display(),
                "registering simulator"
            );
            map.insert(flavour, Arc::clone(&descriptor));
        }
        descriptor
    }

    /// Merge deployment-supplied installs, overriding probed entries.
    pub fn merge_static(&self, installs: &[StaticInstall]) {
        for install in installs {
            self.register_descriptor(Descriptor::new(
                install.path.clone(),
                install.version.clone(),
                install.name.clone(),
                install.license.clone(),
                install.flavours.iter().copied(),
            ));
        }
    }

    pub fn get_descriptor(&self, flavour: Flavour) -> Option<Arc<Descriptor>> {
        self.read().get(&flavour).cloned()
    }

    /// Snapshot of every registration, ordered by flavour.
    pub fn get_all_descriptors(&self) -> Vec<(Flavour, Arc<Descriptor>)> {
        self.read()
            .iter()
            .map(|(flavour, descriptor)| (*flavour, Arc::clone(descriptor)))
            .collect()
    }

    pub fn is_registered(&self, flavour: Flavour) -> bool {
        self.read().contains_key(&flavour)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Human-readable listing used in startup logs and `--dry-run`.
    pub fn report_installed(&self) -> String {
        let mut out = String::new();
        for (flavour, info) in self.get_all_descriptors() {
            let _ = writeln!(
                out,
                "[{flavour}] Simulator: {} Version: {}",
                info.display_name, info.version
            );
            let _ = writeln!(out, "Path: {}", info.executable_path.display());
            if !info.license.is_empty() {
                let _ = writeln!(out, "License: {}", info.license);
            }
        }
        out
    }

    // A panicking writer cannot leave a half-inserted Arc behind, so a
    // poisoned lock is still safe to use.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<Flavour, Arc<Descriptor>>> {
        self.simulators.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<Flavour, Arc<Descriptor>>> {
        self.simulators.write().unwrap_or_else(PoisonError::into_inner)
    }
}

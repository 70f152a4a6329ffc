// src/registry/descriptor.rs

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::types::Flavour;

/// An installed simulator binary and its metadata.
///
/// Immutable once built. The registry hands out `Arc<Descriptor>`, and every
/// flavour alias of one install shares the same allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub executable_path: PathBuf,
    pub version: String,
    pub display_name: String,
    pub license: String,
    pub aliases: BTreeSet<Flavour>,
}

impl Descriptor {
    pub fn new(
        executable_path: impl Into<PathBuf>,
        version: impl Into<String>,
        display_name: impl Into<String>,
        license: impl Into<String>,
        aliases: impl IntoIterator<Item = Flavour>,
    ) -> Self {
        Self {
            executable_path: executable_path.into(),
            version: version.into(),
            display_name: display_name.into(),
            license: license.into(),
            aliases: aliases.into_iter().collect(),
        }
    }
}

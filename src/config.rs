//! Declared-instance manifest loading
//!
//! The manifest is the hand-off point from whatever front end resolved
//! the declarations: addresses, provider references, and fully-resolved
//! argument values only. The engine never sees an unresolved reference.

use anyhow::{Context, Result, bail};
use provision::DeclaredInstance;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub instances: Vec<DeclaredInstance>,
}

impl Manifest {
    /// Load a manifest and check address uniqueness.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;

        let manifest: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse manifest: {}", path.display()))?;

        let mut seen = HashSet::new();
        for instance in &manifest.instances {
            if !seen.insert(instance.address.as_str()) {
                bail!("Duplicate address in manifest: {}", instance.address);
            }
        }

        log::debug!(
            "loaded {} declared instance(s) from {}",
            manifest.instances.len(),
            path.display()
        );
        Ok(manifest)
    }
}

//! Project-local path conventions
//!
//! Everything the engine persists lives under one hidden directory in the
//! project root. Custom state paths stay *relative* on purpose: a plugin
//! that asked for the host working directory to be mounted resolves them
//! against that mount point inside its own container.

use std::path::PathBuf;

/// Hidden directory holding all engine state for a project.
pub const PROJECT_DIR: &str = ".gantry";

/// Root directory for engine state, relative to the project root.
pub fn project_dir() -> PathBuf {
    PathBuf::from(PROJECT_DIR)
}

/// Path of the persisted instance state file.
pub fn state_file() -> PathBuf {
    project_dir().join("state.json")
}

/// Private state directory for one instance address.
///
/// Deterministic and stable across runs, so plugins can rely on it for
/// incremental side-state (e.g. a backing tool's own state files). Owned
/// exclusively by that address's plugin invocations.
pub fn custom_state_dir(address: &str) -> String {
    format!("{PROJECT_DIR}/custom_state/{address}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_state_dir_is_deterministic() {
        assert_eq!(custom_state_dir("app"), custom_state_dir("app"));
    }

    #[test]
    fn custom_state_dir_is_rooted_under_project_dir() {
        assert!(custom_state_dir("app").starts_with(PROJECT_DIR));
        assert!(state_file().starts_with(project_dir()));
    }

    #[test]
    fn distinct_addresses_get_distinct_state_dirs() {
        assert_ne!(custom_state_dir("app"), custom_state_dir("db"));
    }

    #[test]
    fn custom_state_dir_stays_relative() {
        assert!(!custom_state_dir("app").starts_with('/'));
    }
}

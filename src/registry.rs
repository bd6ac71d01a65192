// src/registry.rs

//! Script registry.
//!
//! Maps stable script file identifiers to the display names shown to the
//! user, and filters the static table down to scripts actually present in
//! the scripts directory.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{ProbeError, Result};

/// Known probe scripts, in the order they are presented to the user.
///
/// Left: file identifier under the scripts directory. Right: display name.
pub const SCRIPT_TABLE: &[(&str, &str)] = &[
    ("ixio_add_spam_numbers.py", "ixiO - add spam numbers"),
    ("ixio_add_spam_words.py", "ixiO - add spam words"),
    (
        "mobile_manager_add_spam_numbers.py",
        "Mobile Manager - add spam numbers",
    ),
    (
        "mobile_manager_add_spam_words.py",
        "Mobile Manager - add spam words",
    ),
    (
        "spam_call_noti_add_spam_numbers.py",
        "Spam Call Notification - add spam numbers",
    ),
];

/// One selectable probe script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptDescriptor {
    pub file_id: &'static str,
    pub display_name: &'static str,
}

impl ScriptDescriptor {
    /// Path of this script under `scripts_dir`.
    pub fn path_in(&self, scripts_dir: impl AsRef<Path>) -> PathBuf {
        scripts_dir.as_ref().join(self.file_id)
    }
}

/// Scripts from [`SCRIPT_TABLE`] that exist on disk under `scripts_dir`.
///
/// Order is table declaration order, never filesystem order. A missing
/// directory yields an empty list, not an error.
pub fn available_scripts(scripts_dir: impl AsRef<Path>) -> Vec<ScriptDescriptor> {
    let dir = scripts_dir.as_ref();
    if !dir.is_dir() {
        debug!(?dir, "scripts directory does not exist");
        return Vec::new();
    }

    SCRIPT_TABLE
        .iter()
        .map(|&(file_id, display_name)| ScriptDescriptor {
            file_id,
            display_name,
        })
        .filter(|descriptor| descriptor.path_in(dir).is_file())
        .collect()
}

/// Resolve a file identifier to a runnable script path.
///
/// The identifier must appear in [`SCRIPT_TABLE`] and the file must exist
/// under `scripts_dir`; anything else is [`ProbeError::ScriptNotFound`].
pub fn resolve(scripts_dir: impl AsRef<Path>, file_id: &str) -> Result<PathBuf> {
    let known = SCRIPT_TABLE.iter().any(|(id, _)| *id == file_id);
    if !known {
        return Err(ProbeError::ScriptNotFound(file_id.to_string()));
    }

    let path = scripts_dir.as_ref().join(file_id);
    if !path.is_file() {
        return Err(ProbeError::ScriptNotFound(file_id.to_string()));
    }

    Ok(path)
}

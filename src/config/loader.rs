// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::ConfigFile;
use crate::errors::{ProbeError, Result};

/// Load a configuration file, falling back to defaults when it is absent.
///
/// - Missing file: built-in defaults, no error.
/// - Present file: TOML deserialization plus basic sanity checks.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if !path.exists() {
        debug!(?path, "no config file found; using defaults");
        return Ok(ConfigFile::default());
    }

    let contents = fs::read_to_string(path)?;
    let config: ConfigFile = toml::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

/// Basic semantic validation beyond what `serde` enforces.
pub fn validate_config(config: &ConfigFile) -> Result<()> {
    if config.runner.grace_secs == 0 {
        return Err(ProbeError::ConfigError(
            "runner.grace_secs must be at least 1".to_string(),
        ));
    }

    if config.runner.start_num > config.runner.end_num {
        return Err(ProbeError::ConfigError(format!(
            "runner.start_num ({}) must not exceed runner.end_num ({})",
            config.runner.start_num, config.runner.end_num
        )));
    }

    Ok(())
}

// src/errors.rs

//! Crate-wide error types and aliases.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Script not found: {0}")]
    ScriptNotFound(String),

    #[error("No connected device found (is adb available and a device plugged in?)")]
    NoDevice,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ProbeError>;

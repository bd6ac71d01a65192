// src/config/model.rs

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [runner]
/// interpreter = "python3"
/// scripts_dir = "scripts"
/// grace_secs = 3
/// start_num = 1
/// end_num = 600
///
/// [device]
/// adb = "adb"
/// device_name = "R3CN40XXXXX"
/// platform_version = "14"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigFile {
    /// Script execution settings from `[runner]`.
    #[serde(default)]
    pub runner: RunnerSection,

    /// Device lookup settings from `[device]`.
    #[serde(default)]
    pub device: DeviceSection,
}

/// `[runner]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerSection {
    /// Interpreter the probe scripts are run with.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Directory scanned for known script files.
    ///
    /// A missing directory is not an error; it simply yields zero selectable
    /// scripts.
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: String,

    /// Seconds to wait after a graceful termination request before
    /// force-killing the script process.
    #[serde(default = "default_grace_secs")]
    pub grace_secs: u64,

    /// First entry number a probe script should add.
    #[serde(default = "default_start_num")]
    pub start_num: u32,

    /// Last entry number a probe script should add.
    #[serde(default = "default_end_num")]
    pub end_num: u32,
}

fn default_interpreter() -> String {
    if cfg!(windows) {
        "python".to_string()
    } else {
        "python3".to_string()
    }
}

fn default_scripts_dir() -> String {
    "scripts".to_string()
}

fn default_grace_secs() -> u64 {
    3
}

fn default_start_num() -> u32 {
    1
}

fn default_end_num() -> u32 {
    600
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            scripts_dir: default_scripts_dir(),
            grace_secs: default_grace_secs(),
            start_num: default_start_num(),
            end_num: default_end_num(),
        }
    }
}

/// `[device]` section.
///
/// When `device_name` is set, adb detection is skipped entirely.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSection {
    /// adb program used for device detection.
    #[serde(default = "default_adb")]
    pub adb: String,

    /// Fixed device serial instead of detecting the first connected one.
    #[serde(default)]
    pub device_name: Option<String>,

    /// Fixed platform version instead of querying `getprop`.
    #[serde(default)]
    pub platform_version: Option<String>,
}

fn default_adb() -> String {
    "adb".to_string()
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            adb: default_adb(),
            device_name: None,
            platform_version: None,
        }
    }
}

// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `limitprobe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "limitprobe",
    version,
    about = "Run blocklist limit probe scripts against a connected Android device.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Limitprobe.toml` in the current working directory. A missing
    /// file is not an error; built-in defaults apply.
    #[arg(long, value_name = "PATH", default_value = "Limitprobe.toml")]
    pub config: String,

    /// List the scripts available in the scripts directory and exit.
    #[arg(long)]
    pub list: bool,

    /// File identifier of the script to run (see --list).
    #[arg(long, value_name = "FILE_ID")]
    pub script: Option<String>,

    /// Directory containing the probe scripts (overrides config).
    #[arg(long, value_name = "DIR")]
    pub scripts_dir: Option<String>,

    /// Device serial to target; skips adb detection.
    #[arg(long, value_name = "SERIAL")]
    pub device: Option<String>,

    /// Android platform version of the target device.
    #[arg(long, value_name = "VERSION")]
    pub platform_version: Option<String>,

    /// First entry number the probe script should add (overrides config).
    #[arg(long, value_name = "N")]
    pub start_num: Option<u32>,

    /// Last entry number the probe script should add (overrides config).
    #[arg(long, value_name = "N")]
    pub end_num: Option<u32>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `LIMITPROBE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

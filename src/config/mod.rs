// src/config/mod.rs

//! Optional TOML configuration (`Limitprobe.toml`).
//!
//! Every setting has a default, so a missing config file is not an error.
//! CLI flags override whatever the file provides.

pub mod loader;
pub mod model;

pub use loader::load_or_default;
pub use model::{ConfigFile, DeviceSection, RunnerSection};

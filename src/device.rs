// src/device.rs

//! Connected-device discovery via adb.
//!
//! The probe scripts receive the device identity through environment
//! variables; this module fills in those values by asking adb for the first
//! connected device and a couple of its build properties. Every failure mode
//! (missing adb binary, timeout, no device) degrades to "no device" rather
//! than a hard error, so callers decide whether that is fatal.

use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

const ADB_LIST_TIMEOUT: Duration = Duration::from_secs(10);
const GETPROP_TIMEOUT: Duration = Duration::from_secs(5);

/// Identifying fields forwarded to probe scripts through their environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceContext {
    pub device_name: String,
    pub platform_version: String,
    pub model: String,
}

/// Detect the first device reported by `adb devices`.
///
/// Queries `ro.build.version.release` and `ro.product.model` for the found
/// serial; either property falls back to `"Unknown"` on failure.
pub async fn detect_device(adb: &str) -> Option<DeviceContext> {
    let output = match timeout(ADB_LIST_TIMEOUT, Command::new(adb).arg("devices").output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(err)) => {
            warn!(adb = %adb, error = %err, "failed to run adb");
            return None;
        }
        Err(_) => {
            warn!(adb = %adb, "adb devices timed out");
            return None;
        }
    };

    if !output.status.success() {
        warn!(adb = %adb, status = ?output.status.code(), "adb devices failed");
        return None;
    }

    let listing = String::from_utf8_lossy(&output.stdout);
    let serials = parse_device_list(&listing);
    let device_name = serials.first()?.clone();

    let platform_version =
        get_device_property(adb, &device_name, "ro.build.version.release").await;
    let model = get_device_property(adb, &device_name, "ro.product.model").await;

    debug!(
        device = %device_name,
        version = %platform_version,
        model = %model,
        "detected connected device"
    );

    Some(DeviceContext {
        device_name,
        platform_version,
        model,
    })
}

/// Parse the output of `adb devices`.
///
/// The first line is a header; each following line is `<serial>\t<state>`.
/// Only serials in the `device` state count as connected.
pub fn parse_device_list(output: &str) -> Vec<String> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split('\t');
            let serial = parts.next()?.trim();
            let state = parts.next()?.trim();
            (!serial.is_empty() && state == "device").then(|| serial.to_string())
        })
        .collect()
}

/// Query a single `getprop` value, defaulting to `"Unknown"` on any failure.
async fn get_device_property(adb: &str, serial: &str, prop: &str) -> String {
    let query = Command::new(adb)
        .args(["-s", serial, "shell", "getprop", prop])
        .output();

    match timeout(GETPROP_TIMEOUT, query).await {
        Ok(Ok(output)) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        }
        _ => {
            warn!(serial = %serial, prop = %prop, "getprop failed; using Unknown");
            "Unknown".to_string()
        }
    }
}

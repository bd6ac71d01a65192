#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing_subscriber::{EnvFilter, fmt};

use limitprobe::device::DeviceContext;
use limitprobe::dispatch::{RunEvent, RunRequest};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Device context used by runs that never touch a real device.
pub fn fake_device() -> DeviceContext {
    DeviceContext {
        device_name: "emulator-5554".to_string(),
        platform_version: "14".to_string(),
        model: "TestDevice".to_string(),
    }
}

/// Write a shell script standing in for an automation script.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("writing test script");
    path
}

/// Receive one event, failing the test if none arrives in time.
pub async fn recv_event(rx: &mut mpsc::UnboundedReceiver<RunEvent>) -> RunEvent {
    timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("timed out waiting for a run event")
        .expect("event channel closed unexpectedly")
}

/// Drain the observer channel until it closes, returning every event.
///
/// The channel closes once the supervising task (and its pumps) have
/// dropped their senders, so this also proves the run is fully torn down.
pub async fn collect_events(rx: &mut mpsc::UnboundedReceiver<RunEvent>) -> Vec<RunEvent> {
    let mut events = Vec::new();
    loop {
        match timeout(Duration::from_secs(10), rx.recv()).await {
            Ok(Some(event)) => events.push(event),
            Ok(None) => break,
            Err(_) => panic!("timed out waiting for run events"),
        }
    }
    events
}

/// Run request executing `script_path` with `sh`, so test scripts are plain
/// shell one-liners.
pub fn probe_request(script_path: PathBuf, grace: Duration) -> RunRequest {
    let file_id = script_path
        .file_name()
        .expect("script path has a file name")
        .to_string_lossy()
        .into_owned();

    RunRequest {
        file_id,
        script_path,
        interpreter: "sh".to_string(),
        device: fake_device(),
        start_num: 1,
        end_num: 10,
        grace,
    }
}

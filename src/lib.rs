// src/lib.rs

pub mod cli;
pub mod config;
pub mod device;
pub mod dispatch;
pub mod errors;
pub mod logging;
pub mod registry;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::info;

use crate::cli::CliArgs;
use crate::config::loader::load_or_default;
use crate::config::model::ConfigFile;
use crate::device::DeviceContext;
use crate::dispatch::{Dispatcher, RunEvent, RunOutcome, RunRequest};
use crate::errors::{ProbeError, Result};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (CLI flags take precedence)
/// - script registry lookup
/// - device detection
/// - the dispatcher and its event loop
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(PathBuf::from(&args.config))?;

    let scripts_dir = args
        .scripts_dir
        .clone()
        .unwrap_or_else(|| cfg.runner.scripts_dir.clone());

    if args.list {
        print_available(&scripts_dir);
        return Ok(());
    }

    let Some(file_id) = args.script.clone() else {
        return Err(ProbeError::ConfigError(
            "no script selected; use --script <FILE_ID> or --list".to_string(),
        ));
    };

    let script_path = registry::resolve(&scripts_dir, &file_id)?;
    let device = resolve_device(&args, &cfg).await?;
    info!(
        device = %device.device_name,
        version = %device.platform_version,
        model = %device.model,
        "target device"
    );

    let start_num = args.start_num.unwrap_or(cfg.runner.start_num);
    let end_num = args.end_num.unwrap_or(cfg.runner.end_num);
    if start_num > end_num {
        return Err(ProbeError::ConfigError(format!(
            "start_num ({start_num}) must not exceed end_num ({end_num})"
        )));
    }

    let request = RunRequest {
        file_id,
        script_path,
        interpreter: cfg.runner.interpreter.clone(),
        device,
        start_num,
        end_num,
        grace: Duration::from_secs(cfg.runner.grace_secs),
    };

    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<RunEvent>();

    // Ctrl-C → stop request for the event loop.
    let (stop_tx, stop_rx) = mpsc::channel::<()>(1);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = stop_tx.send(()).await;
    });

    let mut dispatcher = Dispatcher::new();
    dispatcher.start(request, events_tx).await;

    let outcome = drive(&mut dispatcher, &mut events_rx, stop_rx).await;

    match outcome {
        Some(RunOutcome::Completed) => Ok(()),
        Some(RunOutcome::Cancelled) => {
            info!("run cancelled");
            Ok(())
        }
        Some(RunOutcome::Failed(code)) => Err(ProbeError::Other(anyhow!(
            "script failed (exit code: {code})"
        ))),
        None => Err(ProbeError::Other(anyhow!(
            "event channel closed before the run finished"
        ))),
    }
}

/// Print script output lines and translate Ctrl-C into a dispatcher stop.
///
/// Returns the run's terminal outcome, or `None` if the event channel closed
/// without a `Finished` event (which the dispatcher guarantees not to
/// happen).
async fn drive(
    dispatcher: &mut Dispatcher,
    events_rx: &mut mpsc::UnboundedReceiver<RunEvent>,
    mut stop_rx: mpsc::Receiver<()>,
) -> Option<RunOutcome> {
    loop {
        tokio::select! {
            event = events_rx.recv() => match event {
                Some(RunEvent::Line(line)) => println!("{line}"),
                Some(RunEvent::Finished(outcome)) => return Some(outcome),
                None => return None,
            },
            Some(()) = stop_rx.recv() => {
                info!("Ctrl-C received; stopping script");
                // The run's Finished event is in the channel once this
                // returns; keep looping to drain it.
                dispatcher.stop().await;
            }
        }
    }
}

/// Print the scripts currently selectable from `scripts_dir`.
fn print_available(scripts_dir: &str) {
    let scripts = registry::available_scripts(scripts_dir);
    if scripts.is_empty() {
        println!("no scripts found in '{scripts_dir}'");
        return;
    }

    println!("available scripts ({}):", scripts.len());
    for script in &scripts {
        println!("  {:<40} {}", script.file_id, script.display_name);
    }
}

/// Figure out the target device: explicit overrides first, adb detection
/// otherwise. No device at all is an error at this level.
async fn resolve_device(args: &CliArgs, cfg: &ConfigFile) -> Result<DeviceContext> {
    let device_name = args
        .device
        .clone()
        .or_else(|| cfg.device.device_name.clone());
    let platform_version = args
        .platform_version
        .clone()
        .or_else(|| cfg.device.platform_version.clone());

    if let Some(device_name) = device_name {
        return Ok(DeviceContext {
            device_name,
            platform_version: platform_version.unwrap_or_else(|| "Unknown".to_string()),
            model: "Unknown".to_string(),
        });
    }

    let mut detected = device::detect_device(&cfg.device.adb)
        .await
        .ok_or(ProbeError::NoDevice)?;
    if let Some(version) = platform_version {
        detected.platform_version = version;
    }
    Ok(detected)
}

// src/dispatch/runner.rs

//! Background supervision of one probe script process.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::{RunEvent, RunOutcome, RunRequest};

/// Supervise one script run from spawn to `Finished`.
///
/// This is the body of the background task spawned by
/// [`Dispatcher::start`](super::Dispatcher::start). Whatever happens during
/// the run (normal exit, crash, cancellation, spawn failure, stream read
/// failure) exactly one `RunEvent::Finished` is sent, after the last
/// `RunEvent::Line`.
///
/// The observer channel is unbounded: no send in here may ever block on a
/// stalled observer, because `Dispatcher::stop` joins this task and must
/// complete once the child is confirmed dead.
pub(super) async fn supervise(
    request: RunRequest,
    cancel_rx: oneshot::Receiver<()>,
    cancel_requested: Arc<AtomicBool>,
    events_tx: mpsc::UnboundedSender<RunEvent>,
) {
    let outcome = match supervise_inner(&request, cancel_rx, &events_tx).await {
        Ok(status) => {
            let outcome = classify(status, cancel_requested.load(Ordering::SeqCst));
            let line = match outcome {
                RunOutcome::Completed => "script completed successfully".to_string(),
                RunOutcome::Cancelled => "script stopped by user".to_string(),
                RunOutcome::Failed(code) => {
                    format!("script exited with an error (exit code: {code})")
                }
            };
            send_line(&events_tx, line);
            outcome
        }
        Err(err) => {
            warn!(script = %request.file_id, error = %err, "script supervision error");
            send_line(&events_tx, format!("script execution error: {err:#}"));
            RunOutcome::Failed(-1)
        }
    };

    if events_tx.send(RunEvent::Finished(outcome)).is_err() {
        debug!("observer dropped before Finished could be delivered");
    }
}

async fn supervise_inner(
    request: &RunRequest,
    mut cancel_rx: oneshot::Receiver<()>,
    events_tx: &mpsc::UnboundedSender<RunEvent>,
) -> Result<ExitStatus> {
    info!(
        script = %request.file_id,
        interpreter = %request.interpreter,
        device = %request.device.device_name,
        "spawning script process"
    );

    let mut cmd = Command::new(&request.interpreter);
    cmd.arg(&request.script_path)
        .env("APPIUM_DEVICE_NAME", &request.device.device_name)
        .env("APPIUM_PLATFORM_VERSION", &request.device.platform_version)
        .env("PYTHONUNBUFFERED", "1")
        .env("START_NUM", request.start_num.to_string())
        .env("END_NUM", request.end_num.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().with_context(|| {
        format!(
            "spawning '{}' for script '{}'",
            request.interpreter, request.file_id
        )
    })?;

    send_line(events_tx, format!("starting script: {}", request.file_id));

    // Pump both pipes so OS buffers never fill; each pump preserves its own
    // stream's order.
    let mut pumps = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        pumps.push(spawn_line_pump(stdout, events_tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        pumps.push(spawn_line_pump(stderr, events_tx.clone()));
    }

    // Either the process exits on its own, or a stop request arrives and we
    // terminate it (gracefully, then by force after the grace period).
    let status = tokio::select! {
        status_res = child.wait() => {
            status_res.with_context(|| {
                format!("waiting for script '{}'", request.file_id)
            })?
        }
        cancel = &mut cancel_rx => {
            if cancel.is_err() {
                // Sender dropped without an explicit stop, i.e. the
                // dispatcher itself went away; the child must not outlive it.
                debug!(script = %request.file_id, "dispatcher dropped; terminating script");
            }
            stop_child(&mut child, request).await?
        }
    };

    // The pipes close when the child exits; draining the pumps here
    // guarantees `Finished` is emitted after the last line. Pump sends never
    // block (unbounded channel), so this join is bounded by the pipes
    // closing, not by the observer.
    for pump in pumps {
        if let Err(err) = pump.await {
            warn!(error = %err, "output pump failed to join");
        }
    }

    info!(
        script = %request.file_id,
        exit_code = status.code().unwrap_or(-1),
        success = status.success(),
        "script process exited"
    );

    Ok(status)
}

/// Gracefully terminate the child, falling back to a hard kill once the
/// grace period elapses. The child cannot block cancellation indefinitely.
async fn stop_child(child: &mut Child, request: &RunRequest) -> Result<ExitStatus> {
    info!(script = %request.file_id, "cancellation requested; terminating script process");
    request_termination(child);

    match timeout(request.grace, child.wait()).await {
        Ok(status_res) => status_res.with_context(|| {
            format!(
                "waiting for script '{}' after termination request",
                request.file_id
            )
        }),
        Err(_) => {
            warn!(
                script = %request.file_id,
                grace = ?request.grace,
                "script did not exit within grace period; killing"
            );
            child.kill().await.context("killing script process")?;
            child.wait().await.context("reaping killed script process")
        }
    }
}

#[cfg(unix)]
fn request_termination(child: &mut Child) {
    let Some(pid) = child.id() else {
        return;
    };
    // SAFETY: plain kill(2) on our own child's pid.
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if rc != 0 {
        warn!(
            pid,
            error = %std::io::Error::last_os_error(),
            "failed to send SIGTERM"
        );
    }
}

#[cfg(not(unix))]
fn request_termination(child: &mut Child) {
    // No graceful termination signal on this platform; kill outright.
    if let Err(err) = child.start_kill() {
        warn!(error = %err, "failed to kill script process");
    }
}

/// Forward lines from one child pipe to the observer, trimmed and in order.
/// Blank lines are dropped; a read error ends the pump early.
fn spawn_line_pump(
    pipe: impl AsyncRead + Unpin + Send + 'static,
    events_tx: mpsc::UnboundedSender<RunEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let reader = BufReader::new(pipe);
        let mut lines = reader.lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    if events_tx.send(RunEvent::Line(trimmed.to_string())).is_err() {
                        debug!("observer dropped; stopping output pump");
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!(error = %err, "error reading script output");
                    break;
                }
            }
        }
    })
}

/// Map an exit status to a terminal outcome.
///
/// A status from the graceful-stop signal counts as cancelled even if the
/// stop flag was never set (e.g. an external SIGTERM); a forced kill after
/// the grace period counts as cancelled because the flag is set. Exit 0 is
/// always a completion, even if a stop raced with a natural exit.
fn classify(status: ExitStatus, cancel_requested: bool) -> RunOutcome {
    if status.success() {
        return RunOutcome::Completed;
    }

    if cancel_requested || termination_signalled(status) {
        return RunOutcome::Cancelled;
    }

    RunOutcome::Failed(status.code().unwrap_or(-1))
}

#[cfg(unix)]
fn termination_signalled(status: ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    status.signal() == Some(libc::SIGTERM)
}

#[cfg(not(unix))]
fn termination_signalled(_status: ExitStatus) -> bool {
    false
}

fn send_line(events_tx: &mpsc::UnboundedSender<RunEvent>, line: String) {
    if events_tx.send(RunEvent::Line(line)).is_err() {
        debug!("observer dropped; discarding log line");
    }
}

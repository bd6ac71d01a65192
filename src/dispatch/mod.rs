// src/dispatch/mod.rs

//! Script execution dispatcher.
//!
//! This module owns the lifecycle of at most one probe script run at a time:
//!
//! - [`dispatcher`] holds the [`Dispatcher`], which owns the single optional
//!   [`dispatcher::RunHandle`] and implements stop-then-start
//!   (last-writer-wins) and idempotent cancellation.
//! - [`runner`] is the background supervising task: spawn the child, pump its
//!   output lines to the observer channel, classify the exit status, and
//!   always finish with exactly one `Finished` event.

pub mod dispatcher;
pub mod runner;

use std::path::PathBuf;
use std::time::Duration;

use crate::device::DeviceContext;

pub use dispatcher::Dispatcher;

/// Everything needed to launch one probe script.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Stable script identifier, used in log lines.
    pub file_id: String,

    /// Resolved path of the script on disk.
    pub script_path: PathBuf,

    /// Interpreter the script is run with (e.g. `python3`).
    pub interpreter: String,

    /// Device identity forwarded to the child via environment variables.
    pub device: DeviceContext,

    /// First entry number the probe should add.
    pub start_num: u32,

    /// Last entry number the probe should add.
    pub end_num: u32,

    /// How long a stop request waits after graceful termination before
    /// force-killing the child.
    pub grace: Duration,
}

/// Terminal state of a run.
///
/// `Created -> Running -> {Completed | Failed | Cancelled}`; no transition
/// leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Child exited with status 0.
    Completed,
    /// Child exited with a non-zero status, or could not be supervised
    /// (launch failure, stream error); carries the exit code, `-1` when no
    /// code is available.
    Failed(i32),
    /// Child was stopped via [`Dispatcher::stop`] (or the graceful-stop
    /// signal).
    Cancelled,
}

/// Events delivered to the observer channel.
///
/// `Line` events arrive at most once each, in emission order per stream;
/// `Finished` arrives exactly once per run, after the last `Line`. The
/// channel is unbounded: an observer that stops receiving can never
/// back-pressure the supervising task into blocking a stop request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Line(String),
    Finished(RunOutcome),
}

// src/dispatch/dispatcher.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::runner::supervise;
use super::{RunEvent, RunRequest};

/// One in-flight script execution.
///
/// Owned exclusively by the [`Dispatcher`]; at most one exists at any
/// instant.
pub struct RunHandle {
    supervisor: JoinHandle<()>,
    cancel_tx: oneshot::Sender<()>,
    cancel_requested: Arc<AtomicBool>,
}

/// Supervises at most one running probe script.
///
/// Starting a new run first stops any active one (last-writer-wins, not
/// queued execution), so the old run's `Finished` event is delivered before
/// the new run's first `Line`.
pub struct Dispatcher {
    current: Option<RunHandle>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self { current: None }
    }

    /// True while a supervising task is still live.
    pub fn is_running(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|handle| !handle.supervisor.is_finished())
    }

    /// Launch `request`, reporting progress on `events_tx`.
    ///
    /// Stops any previously active run, then spawns one background
    /// supervising task and returns; the caller observes the run only
    /// through [`RunEvent`]s. A script that cannot even be spawned is still
    /// reported through the channel (`Line` with the error, then
    /// `Finished`), never as an error here.
    ///
    /// The channel is unbounded so the supervising task never blocks on a
    /// stalled observer; [`stop`](Self::stop) relies on that to complete.
    pub async fn start(
        &mut self,
        request: RunRequest,
        events_tx: mpsc::UnboundedSender<RunEvent>,
    ) {
        if self.stop().await {
            info!("stopped previous script before starting a new one");
        }

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let cancel_requested = Arc::new(AtomicBool::new(false));

        info!(script = %request.file_id, "starting script run");
        let supervisor = tokio::spawn(supervise(
            request,
            cancel_rx,
            Arc::clone(&cancel_requested),
            events_tx,
        ));

        self.current = Some(RunHandle {
            supervisor,
            cancel_tx,
            cancel_requested,
        });
    }

    /// Stop the active run, if any.
    ///
    /// Returns `false` when the dispatcher is idle or the run has already
    /// finished; `true` once a live run has been confirmed stopped. The
    /// graceful-termination grace period is enforced inside the supervising
    /// task; this method waits for that task to drain, so the run's
    /// `Finished` event has been emitted by the time it returns. Idempotent:
    /// a second call is a no-op returning `false`.
    pub async fn stop(&mut self) -> bool {
        let Some(handle) = self.current.take() else {
            debug!("stop requested but no script is running");
            return false;
        };

        if handle.supervisor.is_finished() {
            reap(handle.supervisor).await;
            return false;
        }

        handle.cancel_requested.store(true, Ordering::SeqCst);
        if handle.cancel_tx.send(()).is_err() {
            // Supervisor finished between the check above and the send.
            reap(handle.supervisor).await;
            return false;
        }

        reap(handle.supervisor).await;
        true
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Await a supervising task, downgrading a panicked join to a warning.
async fn reap(supervisor: JoinHandle<()>) {
    if let Err(err) = supervisor.await {
        warn!(error = %err, "supervising task failed to join");
    }
}

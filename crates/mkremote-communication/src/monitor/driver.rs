//! Tokio driver for the poll loop
//!
//! Runs `tick` forever, sleeping for the delay each tick returns. Ticks never
//! overlap: the next sleep starts only after the previous tick finished. A
//! refresh request cuts the sleep short.

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::poller::AdaptivePoller;
use super::state::MonitorState;

/// Handle to a running monitor task
#[derive(Debug)]
pub struct MonitorHandle {
    shutdown: watch::Sender<bool>,
    state: watch::Receiver<MonitorState>,
    task: JoinHandle<AdaptivePoller>,
}

impl MonitorHandle {
    /// Read-only state channel
    pub fn state(&self) -> watch::Receiver<MonitorState> {
        self.state.clone()
    }

    /// Stop the loop after the current tick and get the poller back
    pub async fn stop(self) -> Result<AdaptivePoller, tokio::task::JoinError> {
        self.shutdown.send_replace(true);
        self.task.await
    }
}

/// Spawn the poll loop on the current runtime
pub fn spawn(mut poller: AdaptivePoller) -> MonitorHandle {
    let (shutdown, mut shutdown_rx) = watch::channel(false);
    let state = poller.subscribe();
    let refresh = poller.refresh_handle();

    let task = tokio::spawn(async move {
        tracing::info!("Status monitor started");
        loop {
            let delay = poller.tick().await;
            if *shutdown_rx.borrow() {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = refresh.notified() => {
                    tracing::trace!("Refresh requested, polling early");
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("Status monitor stopped");
        poller
    });

    MonitorHandle {
        shutdown,
        state,
        task,
    }
}

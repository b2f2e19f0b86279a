//! Adaptive poll loop
//!
//! [`AdaptivePoller::tick`] performs one poll cycle and returns the delay
//! until the next one. It never fails: every outcome, good or bad, ends in a
//! delay. Scheduling is left to the driver, so the loop logic runs in tests
//! without real timers.
//!
//! Cadence:
//! - a latched condition puts the loop in `Backoff`
//! - a transient error keeps the current cadence
//! - a snapshot whose axis positions differ from the previous one gives
//!   `Fast`, an identical one gives `Slow`
//! - a pending refresh request forces `Fast` unless in `Backoff`

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mkremote_core::{
    ApiError, AppEvent, BackoffPolicy, DisplayModel, EventBus, LinkEvent, MachineEvent,
    OperationalCondition, PollMode, SnapshotDiff, SnapshotField, StatusSnapshot,
};
use tokio::sync::{watch, Notify};

use super::controls::MachineControls;
use super::queue::QueueSynchronizer;
use super::reporter::ErrorReporter;
use super::state::{MonitorState, PollIntervals};
use crate::client::MachineClient;

/// Request an out-of-schedule fast poll
#[derive(Debug, Clone, Default)]
pub struct RefreshHandle {
    requested: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl RefreshHandle {
    /// Ask for the next tick to run soon and in `Fast` cadence
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    /// Check if a refresh is waiting to be consumed
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    fn take(&self) -> bool {
        self.requested.swap(false, Ordering::AcqRel)
    }

    pub(crate) async fn notified(&self) {
        self.wake.notified().await
    }
}

/// The status poll loop
pub struct AdaptivePoller {
    client: Arc<MachineClient>,
    queue: Arc<QueueSynchronizer>,
    bus: Arc<EventBus>,
    reporter: ErrorReporter,
    intervals: PollIntervals,
    refresh: RefreshHandle,
    state_tx: watch::Sender<MonitorState>,
    current: Option<StatusSnapshot>,
    condition: OperationalCondition,
    mode: PollMode,
    ticks: u64,
}

impl AdaptivePoller {
    /// Create a poller; nothing is fetched until the first tick
    pub fn new(
        client: Arc<MachineClient>,
        queue: Arc<QueueSynchronizer>,
        bus: Arc<EventBus>,
        intervals: PollIntervals,
    ) -> Self {
        let (state_tx, _) = watch::channel(MonitorState::initial(&intervals));
        Self {
            client,
            queue,
            reporter: ErrorReporter::new(bus.clone()),
            bus,
            intervals,
            refresh: RefreshHandle::default(),
            state_tx,
            current: None,
            condition: OperationalCondition::Nominal,
            mode: PollMode::Slow,
            ticks: 0,
        }
    }

    /// Run one poll cycle and return the delay until the next
    pub async fn tick(&mut self) -> Duration {
        self.ticks += 1;
        let previous_mode = self.mode;
        let refresh = self.refresh.take();

        match self.client.fetch_status().await {
            Ok(snapshot) => self.on_snapshot(snapshot).await,
            Err(err) => self.on_failure(&err),
        }

        if refresh && self.mode != PollMode::Backoff {
            self.mode = PollMode::Fast;
        }

        let interval = self.intervals.for_mode(self.mode);
        if self.mode != previous_mode {
            tracing::debug!("Polling {} -> {}", previous_mode, self.mode);
            self.bus
                .publish(AppEvent::Link(LinkEvent::PollModeChanged {
                    from: previous_mode,
                    to: self.mode,
                    interval_ms: interval.as_millis() as u64,
                }))
                .ok();
        }

        self.publish_state(interval).await;
        tracing::trace!(
            tick = self.ticks,
            mode = %self.mode,
            interval_ms = interval.as_millis() as u64,
            "Poll tick complete"
        );
        interval
    }

    fn on_failure(&mut self, err: &ApiError) {
        let condition = self.reporter.report(err);
        if condition.backoff() == BackoffPolicy::Long {
            if condition != self.condition {
                tracing::error!("{} ({})", condition, err);
                self.set_condition(condition);
            }
            self.mode = PollMode::Backoff;
        }
    }

    async fn on_snapshot(&mut self, snapshot: StatusSnapshot) {
        if !self.condition.is_nominal() {
            tracing::info!("Bridge answered again, leaving {}", self.condition.label());
            self.set_condition(OperationalCondition::Nominal);
        }

        let diff = self
            .current
            .as_ref()
            .map(|previous| SnapshotDiff::between(previous, &snapshot));

        self.mode = match &diff {
            Some(diff) if diff.axes_changed() => PollMode::Fast,
            _ => PollMode::Slow,
        };

        let changed = diff
            .as_ref()
            .map(|d| d.changed().to_vec())
            .unwrap_or_else(|| SnapshotField::ALL.to_vec());
        if !changed.is_empty() {
            self.bus
                .publish(AppEvent::Machine(MachineEvent::StatusUpdated { changed }))
                .ok();
        }

        if !self.queue.is_bootstrapped().await {
            if let Err(err) = self.queue.bootstrap().await {
                self.reporter.report(&err);
            }
        }

        if diff.as_ref().is_some_and(SnapshotDiff::entered_done) {
            let file = self
                .current
                .as_ref()
                .and_then(|s| s.current_file().map(str::to_string));
            self.bus
                .publish(AppEvent::Machine(MachineEvent::ProgramCompleted { file }))
                .ok();
            if let Err(err) = self.queue.advance_on_completion().await {
                self.reporter.report(&err);
            }
        } else {
            if let Err(err) = self.queue.reconcile().await {
                self.reporter.report(&err);
            }
            if let Err(err) = self.queue.heal_if_cleared(snapshot.current_file()).await {
                self.reporter.report(&err);
            }
        }

        self.current = Some(snapshot);
    }

    fn set_condition(&mut self, condition: OperationalCondition) {
        let from = std::mem::replace(&mut self.condition, condition.clone());
        self.bus
            .publish(AppEvent::Link(LinkEvent::ConditionChanged {
                from,
                to: condition,
            }))
            .ok();
    }

    async fn publish_state(&self, interval: Duration) {
        let view = self.queue.view().await;
        self.state_tx.send_replace(MonitorState {
            ticks: self.ticks,
            snapshot: self.current.clone(),
            condition: self.condition.clone(),
            mode: self.mode,
            interval,
            display: DisplayModel::compute(self.current.as_ref(), &self.condition),
            queue: view.local.as_slice().to_vec(),
            queue_sync_pending: view.pending.is_some(),
            errors: self.reporter.messages(),
        });
    }

    /// Latched condition
    pub fn condition(&self) -> &OperationalCondition {
        &self.condition
    }

    /// Current cadence
    pub fn mode(&self) -> PollMode {
        self.mode
    }

    /// Latest snapshot
    pub fn current(&self) -> Option<&StatusSnapshot> {
        self.current.as_ref()
    }

    /// Configured intervals
    pub fn intervals(&self) -> &PollIntervals {
        &self.intervals
    }

    /// Handle for out-of-schedule refreshes
    pub fn refresh_handle(&self) -> RefreshHandle {
        self.refresh.clone()
    }

    /// Read-only state channel
    pub fn subscribe(&self) -> watch::Receiver<MonitorState> {
        self.state_tx.subscribe()
    }

    /// The queue synchronizer this loop advances
    pub fn queue(&self) -> &Arc<QueueSynchronizer> {
        &self.queue
    }

    /// User-facing controls wired to this loop
    pub fn controls(&self) -> MachineControls {
        MachineControls::new(
            self.client.clone(),
            self.queue.clone(),
            self.reporter.clone(),
            self.refresh.clone(),
            self.bus.clone(),
            self.subscribe(),
        )
    }
}

impl std::fmt::Debug for AdaptivePoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptivePoller")
            .field("condition", &self.condition)
            .field("mode", &self.mode)
            .field("ticks", &self.ticks)
            .finish()
    }
}

//! Read-only monitor state
//!
//! Published on a `tokio::sync::watch` channel after every tick. Readers get
//! a consistent copy and never touch the loop's own slots.

use std::time::Duration;

use mkremote_core::{DisplayModel, OperationalCondition, PollMode, StatusSnapshot};
use serde::Serialize;

/// Poll intervals per cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollIntervals {
    /// Interval while the machine moves or right after a command
    pub fast: Duration,
    /// Interval while the machine is stationary
    pub slow: Duration,
    /// Interval while a latched condition is active
    pub backoff: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            fast: Duration::from_millis(200),
            slow: Duration::from_millis(2000),
            backoff: Duration::from_millis(50_000),
        }
    }
}

impl PollIntervals {
    /// Interval for a cadence
    pub fn for_mode(&self, mode: PollMode) -> Duration {
        match mode {
            PollMode::Fast => self.fast,
            PollMode::Slow => self.slow,
            PollMode::Backoff => self.backoff,
        }
    }
}

/// Everything the presentation layer may read
#[derive(Debug, Clone, Serialize)]
pub struct MonitorState {
    /// Ticks performed so far
    pub ticks: u64,
    /// Latest snapshot, `None` before the first successful poll
    pub snapshot: Option<StatusSnapshot>,
    /// Latched condition (`Nominal` when healthy)
    pub condition: OperationalCondition,
    /// Current cadence
    pub mode: PollMode,
    /// Delay before the next tick
    pub interval: Duration,
    /// Display model derived from the snapshot and condition
    pub display: DisplayModel,
    /// Local file queue
    pub queue: Vec<String>,
    /// A queue push failed and is waiting to be retried
    pub queue_sync_pending: bool,
    /// Displayed transient errors
    pub errors: Vec<String>,
}

impl MonitorState {
    /// State before the first tick
    pub fn initial(intervals: &PollIntervals) -> Self {
        let condition = OperationalCondition::Nominal;
        Self {
            ticks: 0,
            snapshot: None,
            display: DisplayModel::compute(None, &condition),
            condition,
            mode: PollMode::Slow,
            interval: intervals.slow,
            queue: Vec::new(),
            queue_sync_pending: false,
            errors: Vec::new(),
        }
    }
}

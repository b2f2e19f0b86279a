//! Status monitor
//!
//! The adaptive poll loop, the queue synchronizer it drives, the controls
//! the presentation layer calls, and the tokio task that schedules ticks.

pub mod controls;
pub mod driver;
pub mod poller;
pub mod queue;
pub mod reporter;
pub mod state;

pub use controls::MachineControls;
pub use driver::{spawn, MonitorHandle};
pub use poller::{AdaptivePoller, RefreshHandle};
pub use queue::{Advance, PendingSync, QueueSynchronizer, QueueView};
pub use reporter::ErrorReporter;
pub use state::{MonitorState, PollIntervals};

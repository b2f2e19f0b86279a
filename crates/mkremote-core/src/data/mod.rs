//! Data models for machine status and the file queue

pub mod diff;
pub mod queue;
pub mod status;

pub use diff::{SnapshotDiff, SnapshotField};
pub use queue::{FileListing, FileQueue, ServerFile};
pub use status::{
    AxisMap, AxisState, InterpreterState, PowerState, ProgramState, RunState, SpindleDirection,
    SpindleState, StatusSnapshot, TaskMode,
};

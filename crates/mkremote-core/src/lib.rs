//! # mkremote Core
//!
//! Core types for the mkremote client: the error taxonomy, operational
//! conditions, the status snapshot model with its wire decoding and diffing,
//! the file-queue model, typed machine commands, the pure display model and
//! the event bus the presentation layer listens on.

pub mod announcer;
pub mod command;
pub mod condition;
pub mod data;
pub mod display;
pub mod endpoints;
pub mod error;
pub mod event_bus;

pub use announcer::{AnnouncedError, ErrorAnnouncer};

pub use command::{
    BrakeCommand, DirectionCommand, HomeCommand, JogRequest, MachineCommand,
    MachineStatusCommand, ProgramCommand, SpindleCommand, SpindleSpeedStep, SpindleSwitch,
    MAX_FEED_OVERRIDE, MAX_SPINDLE_OVERRIDE,
};

pub use condition::{BackoffPolicy, OperationalCondition, PollMode};

pub use data::{
    AxisMap, AxisState, FileListing, FileQueue, InterpreterState, PowerState, ProgramState,
    RunState, ServerFile, SnapshotDiff, SnapshotField, SpindleDirection, SpindleState,
    StatusSnapshot, TaskMode,
};

pub use display::{AxisRow, DisplayModel, ViewMode};

pub use endpoints::Endpoints;

pub use error::{ApiError, Error, RequestChannel, Result, ValidationError};

pub use event_bus::{
    AppEvent, ErrorEvent, EventBus, EventBusConfig, EventCategory, EventFilter, LinkEvent,
    MachineEvent, QueueEvent, SubscriptionId,
};

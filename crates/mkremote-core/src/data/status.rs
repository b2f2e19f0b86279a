//! Machine status snapshot
//!
//! One complete machine-status reading, decoded from the controller bridge's
//! JSON. A snapshot is immutable: every successful poll produces a fresh one
//! that supersedes the previous one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ApiError;

/// Canonical axis ordering used by the controller
const AXIS_ORDER: [&str; 9] = ["x", "y", "z", "a", "b", "c", "u", "v", "w"];

/// Status of the last command executed by the controller task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunState {
    /// Nothing has been run yet
    #[serde(rename = "IDLE", alias = "RCS_IDLE")]
    Idle,
    /// A program or command is executing
    #[serde(rename = "EXECUTING", alias = "RCS_EXEC", alias = "EXEC")]
    Executing,
    /// The last program or command completed
    #[serde(rename = "DONE", alias = "RCS_DONE")]
    Done,
    /// The last program or command failed
    #[serde(rename = "ERROR", alias = "RCS_ERROR")]
    Error,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Executing => write!(f, "EXECUTING"),
            Self::Done => write!(f, "DONE"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// G-code interpreter state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterpreterState {
    /// Interpreter is idle
    #[serde(rename = "INTERP_IDLE", alias = "IDLE")]
    Idle,
    /// Interpreter is reading a program
    #[serde(rename = "INTERP_READING", alias = "READING")]
    Reading,
    /// Interpreter is paused
    #[serde(rename = "INTERP_PAUSED", alias = "PAUSED")]
    Paused,
    /// Interpreter is waiting on motion or I/O
    #[serde(rename = "INTERP_WAITING", alias = "WAITING")]
    Waiting,
}

impl InterpreterState {
    /// Short lowercase label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Reading => "reading",
            Self::Paused => "paused",
            Self::Waiting => "waiting",
        }
    }
}

/// Controller task mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskMode {
    /// Manual (jog) mode
    #[serde(rename = "MODE_MANUAL", alias = "MANUAL")]
    Manual,
    /// Automatic (program) mode
    #[serde(rename = "MODE_AUTO", alias = "AUTO")]
    Auto,
    /// Manual data input mode
    #[serde(rename = "MODE_MDI", alias = "MDI")]
    Mdi,
}

impl TaskMode {
    /// Short lowercase label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Auto => "auto",
            Self::Mdi => "mdi",
        }
    }
}

/// Spindle rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpindleDirection {
    /// Counter-clockwise (-1)
    Reverse,
    /// Not rotating (0)
    Stopped,
    /// Clockwise (1)
    Forward,
}

impl TryFrom<i64> for SpindleDirection {
    type Error = ApiError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Reverse),
            0 => Ok(Self::Stopped),
            1 => Ok(Self::Forward),
            other => Err(ApiError::malformed(format!(
                "spindle direction must be -1, 0 or 1, got {}",
                other
            ))),
        }
    }
}

/// Power and emergency-stop state
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerState {
    /// Machine power is on
    pub enabled: bool,
    /// Emergency stop is engaged
    pub estop_engaged: bool,
}

/// Program / interpreter state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramState {
    /// File loaded in the controller, `None` when nothing is open
    pub current_file: Option<String>,
    /// Interpreter state
    pub interpreter_state: InterpreterState,
    /// Task mode
    pub task_mode: TaskMode,
    /// Status of the last executed command
    pub run_state: RunState,
    /// Feed override ratio (1.0 = 100%)
    pub feed_override: f64,
    /// A tool change is waiting for the operator
    pub tool_change_pending: bool,
}

/// Spindle state
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpindleState {
    /// Spindle speed in RPM
    pub speed: f64,
    /// Spindle brake is engaged
    pub brake_engaged: bool,
    /// Rotation direction
    pub direction: SpindleDirection,
    /// Spindle override ratio (1.0 = 100%)
    pub override_ratio: f64,
    /// Spindle is enabled
    pub enabled: bool,
}

/// Position and homing state of one axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisState {
    /// Axis position in machine units
    pub position: f64,
    /// Axis has been homed
    pub homed: bool,
}

/// Ordered mapping of axis name to axis state
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AxisMap(Vec<(String, AxisState)>);

impl AxisMap {
    /// Build a map, ordering axes canonically (x, y, z, a, b, c, u, v, w)
    pub fn new(axes: impl IntoIterator<Item = (String, AxisState)>) -> Self {
        let mut axes: Vec<(String, AxisState)> = axes.into_iter().collect();
        axes.sort_by(|(a, _), (b, _)| axis_rank(a).cmp(&axis_rank(b)).then_with(|| a.cmp(b)));
        Self(axes)
    }

    /// Look up an axis by name
    pub fn get(&self, name: &str) -> Option<&AxisState> {
        self.0
            .iter()
            .find(|(axis, _)| axis == name)
            .map(|(_, state)| state)
    }

    /// Iterate axes in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AxisState)> {
        self.0.iter().map(|(name, state)| (name.as_str(), state))
    }

    /// Number of axes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no axes
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of homed axes
    pub fn homed_count(&self) -> usize {
        self.0.iter().filter(|(_, state)| state.homed).count()
    }

    /// Every axis is homed (false for an empty map)
    pub fn all_homed(&self) -> bool {
        !self.0.is_empty() && self.homed_count() == self.0.len()
    }
}

fn axis_rank(name: &str) -> usize {
    AXIS_ORDER
        .iter()
        .position(|axis| axis.eq_ignore_ascii_case(name))
        .unwrap_or(AXIS_ORDER.len())
}

/// One complete machine-status reading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    /// Power / e-stop
    pub power: PowerState,
    /// Program / interpreter
    pub program: ProgramState,
    /// Spindle
    pub spindle: SpindleState,
    /// Axis positions, canonically ordered
    pub axes: AxisMap,
    /// Maximum velocity reported by the controller
    pub max_velocity: f64,
}

impl StatusSnapshot {
    /// Decode a status object as emitted by the controller bridge
    pub fn from_value(value: serde_json::Value) -> Result<Self, ApiError> {
        let wire: wire::StatusWire = serde_json::from_value(value)
            .map_err(|e| ApiError::malformed(format!("invalid machine status: {}", e)))?;
        wire.into_snapshot()
    }

    /// Name of the loaded file, if any
    pub fn current_file(&self) -> Option<&str> {
        self.program.current_file.as_deref()
    }
}

mod wire {
    //! Field names as the controller bridge emits them.

    use super::*;

    /// Booleans arrive as JSON bools or as 0/1 integers
    #[derive(Debug, Clone, Copy, Deserialize)]
    #[serde(untagged)]
    pub(super) enum Flag {
        Bool(bool),
        Int(i64),
    }

    impl Default for Flag {
        fn default() -> Self {
            Flag::Bool(false)
        }
    }

    impl From<Flag> for bool {
        fn from(flag: Flag) -> bool {
            match flag {
                Flag::Bool(b) => b,
                Flag::Int(n) => n > 0,
            }
        }
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct StatusWire {
        pub power: PowerWire,
        #[serde(alias = "axes")]
        pub position: BTreeMap<String, AxisWire>,
        pub spindle: SpindleWire,
        pub program: ProgramWire,
        #[serde(default)]
        pub values: ValuesWire,
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct PowerWire {
        #[serde(default)]
        pub enabled: Flag,
        #[serde(default, alias = "estop_engaged")]
        pub estop: Flag,
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct AxisWire {
        #[serde(alias = "position")]
        pub pos: f64,
        #[serde(default)]
        pub homed: Flag,
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct SpindleWire {
        #[serde(default, alias = "speed")]
        pub spindle_speed: f64,
        #[serde(default, alias = "enabled")]
        pub spindle_enabled: Flag,
        #[serde(default, alias = "brake")]
        pub spindle_brake: Flag,
        #[serde(default, alias = "direction")]
        pub spindle_direction: i64,
        #[serde(default = "unity", alias = "override_ratio")]
        pub spindlerate: f64,
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct ProgramWire {
        #[serde(default)]
        pub file: Option<String>,
        pub interp_state: InterpreterState,
        pub task_mode: TaskMode,
        #[serde(alias = "run_state")]
        pub rcs_state: RunState,
        #[serde(default = "unity", alias = "feed_override")]
        pub feedrate: f64,
        #[serde(default)]
        pub tool_change: Flag,
    }

    #[derive(Debug, Default, Deserialize)]
    pub(super) struct ValuesWire {
        #[serde(default, alias = "max_velocity")]
        pub velocity: f64,
    }

    fn unity() -> f64 {
        1.0
    }

    impl StatusWire {
        pub(super) fn into_snapshot(self) -> Result<StatusSnapshot, ApiError> {
            let wire = self;
            let direction = SpindleDirection::try_from(wire.spindle.spindle_direction)?;
            let current_file = wire.program.file.filter(|f| !f.trim().is_empty());

            Ok(StatusSnapshot {
                power: PowerState {
                    enabled: wire.power.enabled.into(),
                    estop_engaged: wire.power.estop.into(),
                },
                program: ProgramState {
                    current_file,
                    interpreter_state: wire.program.interp_state,
                    task_mode: wire.program.task_mode,
                    run_state: wire.program.rcs_state,
                    feed_override: wire.program.feedrate,
                    tool_change_pending: wire.program.tool_change.into(),
                },
                spindle: SpindleState {
                    speed: wire.spindle.spindle_speed,
                    brake_engaged: wire.spindle.spindle_brake.into(),
                    direction,
                    override_ratio: wire.spindle.spindlerate,
                    enabled: wire.spindle.spindle_enabled.into(),
                },
                axes: AxisMap::new(wire.position.into_iter().map(|(name, axis)| {
                    (
                        name.to_ascii_lowercase(),
                        AxisState {
                            position: axis.pos,
                            homed: axis.homed.into(),
                        },
                    )
                })),
                max_velocity: wire.values.velocity,
            })
        }
    }
}

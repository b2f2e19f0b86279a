//! Display model
//!
//! Pure projection of the latest snapshot and the current operational
//! condition into what a renderer needs. Nothing here touches a UI toolkit;
//! the renderer receives a [`DisplayModel`] and decides how to draw it.

use serde::Serialize;

use crate::condition::OperationalCondition;
use crate::data::{SpindleDirection, StatusSnapshot};

/// Which view the renderer should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ViewMode {
    /// Normal machine controller view
    Controller,
    /// Bridge service is unreachable
    ServiceDown,
    /// Machine controller process is not running
    ControllerOffline,
    /// Credential was rejected
    NotAuthorized,
}

impl ViewMode {
    /// Degraded view for latched conditions, controller view otherwise
    pub fn for_condition(condition: &OperationalCondition) -> Self {
        match condition {
            OperationalCondition::ServiceDown => Self::ServiceDown,
            OperationalCondition::ControllerOffline => Self::ControllerOffline,
            OperationalCondition::Unauthorized => Self::NotAuthorized,
            OperationalCondition::Nominal | OperationalCondition::UnknownError(_) => {
                Self::Controller
            }
        }
    }
}

/// One row of the axis readout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisRow {
    /// Axis name (lowercase)
    pub name: String,
    /// Position formatted to three decimals, with " (H)" when homed
    pub text: String,
    /// Axis is homed
    pub homed: bool,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayModel {
    /// View to show
    pub mode: ViewMode,
    /// Loaded file, if any
    pub current_file: Option<String>,
    /// Power on
    pub power_on: bool,
    /// E-stop engaged
    pub estop_engaged: bool,
    /// Interpreter label
    pub interpreter: Option<&'static str>,
    /// Task-mode label
    pub task_mode: Option<&'static str>,
    /// Spindle speed in RPM
    pub spindle_speed: f64,
    /// Axis readout
    pub axes: Vec<AxisRow>,
    /// Every axis is homed
    pub all_homed: bool,
    /// Status tags a renderer can map to CSS classes or indicator lights
    pub tags: Vec<String>,
    /// Condition message for degraded views
    pub banner: Option<String>,
}

impl DisplayModel {
    /// Compute the display model; `snapshot` is `None` before the first poll
    pub fn compute(snapshot: Option<&StatusSnapshot>, condition: &OperationalCondition) -> Self {
        let mode = ViewMode::for_condition(condition);
        let banner = (mode != ViewMode::Controller).then(|| condition.to_string());

        let Some(status) = snapshot.filter(|_| mode == ViewMode::Controller) else {
            return Self {
                mode,
                current_file: None,
                power_on: false,
                estop_engaged: false,
                interpreter: None,
                task_mode: None,
                spindle_speed: 0.0,
                axes: Vec::new(),
                all_homed: false,
                tags: vec![condition.label().to_string()],
                banner,
            };
        };

        let axes = status
            .axes
            .iter()
            .map(|(name, axis)| AxisRow {
                name: name.to_string(),
                text: if axis.homed {
                    format!("{:.3} (H)", axis.position)
                } else {
                    format!("{:.3}", axis.position)
                },
                homed: axis.homed,
            })
            .collect();

        Self {
            mode,
            current_file: status.program.current_file.clone(),
            power_on: status.power.enabled,
            estop_engaged: status.power.estop_engaged,
            interpreter: Some(status.program.interpreter_state.label()),
            task_mode: Some(status.program.task_mode.label()),
            spindle_speed: status.spindle.speed,
            axes,
            all_homed: status.axes.all_homed(),
            tags: status_tags(status),
            banner,
        }
    }
}

fn status_tags(status: &StatusSnapshot) -> Vec<String> {
    let mut tags = vec![
        if status.program.current_file.is_some() {
            "file-selected"
        } else {
            "no-file-selected"
        },
        if status.power.enabled {
            "power-on"
        } else {
            "power-off"
        },
        if status.power.estop_engaged {
            "estop-enabled"
        } else {
            "estop-disabled"
        },
        if status.axes.all_homed() {
            "homed"
        } else {
            "unhomed"
        },
        if status.spindle.brake_engaged {
            "spindle-brake-engaged"
        } else {
            "spindle-brake-disengaged"
        },
        match status.spindle.direction {
            SpindleDirection::Forward => "spindle-forward",
            SpindleDirection::Reverse => "spindle-reverse",
            SpindleDirection::Stopped => "spindle-not-moving",
        },
    ]
    .into_iter()
    .map(String::from)
    .collect::<Vec<_>>();

    tags.push(format!("interp-{}", status.program.interpreter_state.label()));
    tags.push(format!("mode-{}", status.program.task_mode.label()));
    if status.program.tool_change_pending {
        tags.push("tool-change".to_string());
    }
    tags
}

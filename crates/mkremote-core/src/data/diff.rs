//! Snapshot diffing
//!
//! Structural comparison of two consecutive snapshots. The poll loop uses the
//! axis comparison to pick its cadence and the run-state transition to detect
//! program completion.

use serde::{Deserialize, Serialize};

use super::status::{RunState, StatusSnapshot};

/// A top-level group of snapshot fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapshotField {
    /// Power or e-stop changed
    Power,
    /// Loaded file changed
    CurrentFile,
    /// Interpreter state or task mode changed
    Interpreter,
    /// Run state changed
    RunState,
    /// Feed override or tool-change flag changed
    Overrides,
    /// Any spindle field changed
    Spindle,
    /// Any axis position or homing flag changed
    Axes,
    /// Maximum velocity changed
    MaxVelocity,
}

impl SnapshotField {
    /// Every field group, in declaration order
    pub const ALL: [SnapshotField; 8] = [
        SnapshotField::Power,
        SnapshotField::CurrentFile,
        SnapshotField::Interpreter,
        SnapshotField::RunState,
        SnapshotField::Overrides,
        SnapshotField::Spindle,
        SnapshotField::Axes,
        SnapshotField::MaxVelocity,
    ];
}

/// Result of comparing two snapshots
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SnapshotDiff {
    changed: Vec<SnapshotField>,
    run_state: Option<(RunState, RunState)>,
}

impl SnapshotDiff {
    /// Compare `previous` against `current`
    pub fn between(previous: &StatusSnapshot, current: &StatusSnapshot) -> Self {
        let mut changed = Vec::new();
        let (p, c) = (&previous.program, &current.program);

        if previous.power != current.power {
            changed.push(SnapshotField::Power);
        }
        if p.current_file != c.current_file {
            changed.push(SnapshotField::CurrentFile);
        }
        if p.interpreter_state != c.interpreter_state || p.task_mode != c.task_mode {
            changed.push(SnapshotField::Interpreter);
        }
        if p.run_state != c.run_state {
            changed.push(SnapshotField::RunState);
        }
        if p.feed_override != c.feed_override || p.tool_change_pending != c.tool_change_pending {
            changed.push(SnapshotField::Overrides);
        }
        if previous.spindle != current.spindle {
            changed.push(SnapshotField::Spindle);
        }
        if previous.axes != current.axes {
            changed.push(SnapshotField::Axes);
        }
        if previous.max_velocity != current.max_velocity {
            changed.push(SnapshotField::MaxVelocity);
        }

        let run_state = (p.run_state != c.run_state).then_some((p.run_state, c.run_state));

        Self { changed, run_state }
    }

    /// Fields that changed, in declaration order
    pub fn changed(&self) -> &[SnapshotField] {
        &self.changed
    }

    /// Check if a field group changed
    pub fn contains(&self, field: SnapshotField) -> bool {
        self.changed.contains(&field)
    }

    /// Check if nothing changed
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    /// Axis positions differ, i.e. the machine is moving
    pub fn axes_changed(&self) -> bool {
        self.contains(SnapshotField::Axes)
    }

    /// Run-state transition, if the run state changed
    pub fn run_state_transition(&self) -> Option<(RunState, RunState)> {
        self.run_state
    }

    /// The run state moved into `DONE` on this pair of snapshots
    ///
    /// Edge, not level: two consecutive `DONE` readings report `false`.
    pub fn entered_done(&self) -> bool {
        matches!(self.run_state, Some((from, RunState::Done)) if from != RunState::Done)
    }
}

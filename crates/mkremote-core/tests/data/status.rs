use mkremote_core::{
    DisplayModel, InterpreterState, OperationalCondition, RunState, SnapshotDiff, SnapshotField,
    SpindleDirection, StatusSnapshot, TaskMode, ViewMode,
};
use serde_json::{json, Value};

fn status(x: f64, rcs_state: &str) -> Value {
    json!({
        "power": {"enabled": 1, "estop": 0},
        "position": {
            "x": {"pos": x, "homed": 1},
            "y": {"pos": 0.0, "homed": 1},
            "z": {"pos": 0.0, "homed": 1}
        },
        "spindle": {
            "spindle_speed": 0,
            "spindle_enabled": 0,
            "spindle_brake": 1,
            "spindle_direction": 0,
            "spindlerate": 1.0
        },
        "program": {
            "file": "",
            "interp_state": "INTERP_IDLE",
            "task_mode": "MODE_MANUAL",
            "feedrate": 1.0,
            "rcs_state": rcs_state,
            "tool_change": 0
        },
        "values": {"velocity": 40.0}
    })
}

#[test]
fn test_decode_minimal_bridge_status() {
    let snapshot = StatusSnapshot::from_value(status(1.0, "RCS_DONE")).unwrap();

    assert!(snapshot.power.enabled);
    assert!(!snapshot.power.estop_engaged);
    assert_eq!(snapshot.current_file(), None);
    assert_eq!(snapshot.program.interpreter_state, InterpreterState::Idle);
    assert_eq!(snapshot.program.task_mode, TaskMode::Manual);
    assert_eq!(snapshot.program.run_state, RunState::Done);
    assert_eq!(snapshot.spindle.direction, SpindleDirection::Stopped);
    assert!(snapshot.axes.all_homed());
}

#[test]
fn test_bad_direction_is_malformed() {
    let mut value = status(0.0, "IDLE");
    value["spindle"]["spindle_direction"] = json!(2);
    let err = StatusSnapshot::from_value(value).unwrap_err();
    assert!(err.to_string().starts_with("Malformed response body"));
}

#[test]
fn test_unknown_run_state_is_malformed() {
    assert!(StatusSnapshot::from_value(status(0.0, "RCS_MAYBE")).is_err());
}

#[test]
fn test_motion_then_completion() {
    let moving = StatusSnapshot::from_value(status(1.0, "EXECUTING")).unwrap();
    let moved = StatusSnapshot::from_value(status(2.0, "EXECUTING")).unwrap();
    let done = StatusSnapshot::from_value(status(2.0, "DONE")).unwrap();

    let diff = SnapshotDiff::between(&moving, &moved);
    assert!(diff.axes_changed());
    assert!(!diff.entered_done());

    let diff = SnapshotDiff::between(&moved, &done);
    assert!(!diff.axes_changed());
    assert!(diff.entered_done());
    assert_eq!(diff.changed(), &[SnapshotField::RunState]);
}

#[test]
fn test_display_model_from_decoded_status() {
    let snapshot = StatusSnapshot::from_value(status(3.14159, "IDLE")).unwrap();
    let model = DisplayModel::compute(Some(&snapshot), &OperationalCondition::Nominal);

    assert_eq!(model.mode, ViewMode::Controller);
    assert_eq!(model.axes[0].name, "x");
    assert_eq!(model.axes[0].text, "3.142 (H)");
    assert!(model.all_homed);
    assert!(model.tags.contains(&"homed".to_string()));
    assert!(model.tags.contains(&"mode-manual".to_string()));
}

#[test]
fn test_display_model_before_first_poll() {
    let model = DisplayModel::compute(None, &OperationalCondition::Nominal);
    assert_eq!(model.mode, ViewMode::Controller);
    assert!(model.axes.is_empty());
    assert_eq!(model.tags, vec!["nominal".to_string()]);
}

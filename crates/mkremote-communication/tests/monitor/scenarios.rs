use std::time::Duration;

use mkremote_communication::monitor;
use mkremote_communication::FileUpload;
use mkremote_core::{
    ApiError, AppEvent, EventCategory, EventFilter, OperationalCondition, PollMode, QueueEvent,
    ValidationError,
};

use crate::mock::{harness, status, MockApi};

const FAST: Duration = Duration::from_millis(200);
const SLOW: Duration = Duration::from_millis(2000);
const BACKOFF: Duration = Duration::from_millis(50_000);

#[tokio::test]
async fn test_completion_advances_queue_and_opens_next() {
    let mut h = harness(MockApi::with_queue(&["a.nc", "b.nc"]));
    h.queue.bootstrap().await.unwrap();
    assert_eq!(h.api.opened(), vec!["a.nc"]);

    h.api.script([
        status(1.0, "EXECUTING", "a.nc"),
        status(1.0, "DONE", "a.nc"),
    ]);
    h.poller.tick().await;
    h.poller.tick().await;

    let view = h.queue.view().await;
    assert_eq!(view.local.as_slice(), &["b.nc".to_string()]);
    assert!(view.in_sync());
    assert_eq!(h.api.server_queue(), vec!["b.nc"]);
    assert_eq!(h.api.opened(), vec!["a.nc", "b.nc"]);
}

#[tokio::test]
async fn test_completion_with_empty_queue_opens_none() {
    let mut h = harness(MockApi::new());
    h.queue.bootstrap().await.unwrap();

    h.api.script([
        status(0.0, "EXECUTING", "x.nc"),
        status(0.0, "DONE", "x.nc"),
    ]);
    h.poller.tick().await;
    h.poller.tick().await;

    assert!(h.queue.view().await.local.is_empty());
    assert_eq!(h.api.opened(), vec!["", ""]);
}

#[tokio::test]
async fn test_done_level_does_not_advance_twice() {
    let mut h = harness(MockApi::with_queue(&["a.nc", "b.nc", "c.nc"]));
    h.queue.bootstrap().await.unwrap();

    h.api.script([
        status(0.0, "EXECUTING", "a.nc"),
        status(0.0, "DONE", "a.nc"),
        status(0.0, "DONE", "b.nc"),
        status(0.0, "DONE", "b.nc"),
    ]);
    for _ in 0..4 {
        h.poller.tick().await;
    }

    assert_eq!(h.api.server_queue(), vec!["b.nc", "c.nc"]);
}

#[tokio::test]
async fn test_controller_offline_backs_off() {
    let mut h = harness(MockApi::new());
    h.api.script([Err(ApiError::remote(
        "Machinekit is not running please restart machinekit and then the server!",
        Some(500),
    ))]);

    let delay = h.poller.tick().await;
    assert_eq!(delay, BACKOFF);
    assert_eq!(h.poller.mode(), PollMode::Backoff);
    assert_eq!(
        h.poller.condition(),
        &OperationalCondition::ControllerOffline
    );

    let delay = h.poller.tick().await;
    assert_eq!(delay, BACKOFF);
    assert_eq!(h.api.count("/status"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_loop_keeps_running_through_backoff() {
    let h = harness(MockApi::new());
    let api = h.api.clone();
    api.script([Err(ApiError::remote("emcStatusBuffer invalid err=3", None))]);

    let handle = monitor::spawn(h.poller);
    tokio::time::sleep(Duration::from_secs(51)).await;
    assert!(api.count("/status") >= 2);

    let state = handle.state().borrow().clone();
    assert_eq!(state.condition, OperationalCondition::ControllerOffline);
    assert_eq!(state.interval, BACKOFF);

    let poller = handle.stop().await.unwrap();
    assert_eq!(poller.mode(), PollMode::Backoff);
}

#[tokio::test]
async fn test_recovery_clears_latched_condition() {
    let mut h = harness(MockApi::new());
    let mut events = h.bus.receiver();
    h.api.script([
        Err(ApiError::Network {
            url: "http://bridge/status".to_string(),
            reason: "connection refused".to_string(),
        }),
        status(0.0, "IDLE", ""),
    ]);

    assert_eq!(h.poller.tick().await, BACKOFF);
    assert_eq!(h.poller.condition(), &OperationalCondition::ServiceDown);

    assert_eq!(h.poller.tick().await, SLOW);
    assert!(h.poller.condition().is_nominal());

    let mut conditions = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let AppEvent::Link(mkremote_core::LinkEvent::ConditionChanged { to, .. }) = event {
            conditions.push(to);
        }
    }
    assert_eq!(
        conditions,
        vec![
            OperationalCondition::ServiceDown,
            OperationalCondition::Nominal
        ]
    );
}

#[tokio::test]
async fn test_unauthorized_backs_off() {
    let mut h = harness(MockApi::new());
    h.api.script([Err(ApiError::HttpStatus {
        status: 403,
        message: "Forbidden".to_string(),
    })]);

    assert_eq!(h.poller.tick().await, BACKOFF);
    assert_eq!(h.poller.condition(), &OperationalCondition::Unauthorized);
    let state = h.poller.subscribe().borrow().clone();
    assert_eq!(state.display.mode, mkremote_core::ViewMode::NotAuthorized);
}

#[tokio::test]
async fn test_transient_error_keeps_interval_and_is_shown_once() {
    let mut h = harness(MockApi::new());
    h.api.script([
        status(1.0, "EXECUTING", "a.nc"),
        status(2.0, "EXECUTING", "a.nc"),
        Err(ApiError::remote("spindle fault", Some(400))),
        Err(ApiError::remote("spindle fault", Some(400))),
    ]);

    assert_eq!(h.poller.tick().await, SLOW);
    assert_eq!(h.poller.tick().await, FAST);
    assert_eq!(h.poller.tick().await, FAST);
    assert_eq!(h.poller.tick().await, FAST);
    assert!(h.poller.condition().is_nominal());

    let state = h.poller.subscribe().borrow().clone();
    assert_eq!(state.errors, vec!["spindle fault"]);
}

#[tokio::test]
async fn test_command_forces_fast_poll() {
    let mut h = harness(MockApi::new());
    h.api.script([status(0.0, "IDLE", "")]);
    let controls = h.poller.controls();

    assert_eq!(h.poller.tick().await, SLOW);
    assert_eq!(h.poller.tick().await, SLOW);

    controls.home_all().await.unwrap();
    assert_eq!(h.poller.tick().await, FAST);
    assert_eq!(h.poller.tick().await, SLOW);
}

#[tokio::test]
async fn test_cleared_file_is_reopened() {
    let mut h = harness(MockApi::with_queue(&["a.nc"]));
    h.queue.bootstrap().await.unwrap();
    h.api.script([status(0.0, "IDLE", "a.nc"), status(0.0, "IDLE", "")]);

    h.poller.tick().await;
    assert_eq!(h.api.opened(), vec!["a.nc"]);

    h.poller.tick().await;
    assert_eq!(h.api.opened(), vec!["a.nc", "a.nc"]);
}

#[tokio::test]
async fn test_failed_advance_push_is_reconciled() {
    let mut h = harness(MockApi::with_queue(&["a.nc", "b.nc"]));
    h.queue.bootstrap().await.unwrap();
    h.api.script([
        status(0.0, "EXECUTING", "a.nc"),
        status(0.0, "DONE", "a.nc"),
        status(0.0, "IDLE", "a.nc"),
    ]);

    h.poller.tick().await;
    h.api.fail_next_pushes(1);
    h.poller.tick().await;

    let view = h.queue.view().await;
    assert_eq!(view.local.as_slice(), &["b.nc".to_string()]);
    assert_eq!(h.api.server_queue(), vec!["a.nc", "b.nc"]);
    assert_eq!(view.pending, Some(monitor::PendingSync::PushThenOpen));
    assert_eq!(h.api.opened(), vec!["a.nc"]);
    assert!(h.poller.subscribe().borrow().queue_sync_pending);

    h.poller.tick().await;
    assert!(h.queue.view().await.in_sync());
    assert_eq!(h.api.server_queue(), vec!["b.nc"]);
    assert_eq!(h.api.opened(), vec!["a.nc", "b.nc"]);
}

#[tokio::test]
async fn test_failed_bootstrap_never_overwrites_server_queue() {
    let mut h = harness(MockApi::with_queue(&["a.nc", "b.nc"]));
    h.api.fail_next("/server/files", 3);
    assert!(h.queue.bootstrap().await.is_err());

    h.api.script([
        status(0.0, "EXECUTING", "a.nc"),
        status(0.0, "DONE", "a.nc"),
        status(0.0, "IDLE", "a.nc"),
    ]);
    h.poller.tick().await;
    h.poller.tick().await;
    assert!(!h.queue.is_bootstrapped().await);
    assert_eq!(h.api.server_queue(), vec!["a.nc", "b.nc"]);
    assert_eq!(h.api.count("/server/update_file_queue"), 0);

    h.poller.tick().await;
    let view = h.queue.view().await;
    assert!(view.in_sync());
    assert_eq!(view.local.as_slice(), &["a.nc".to_string(), "b.nc".to_string()]);
    assert_eq!(h.api.opened(), vec!["a.nc"]);

    h.queue.enqueue("c.nc").await.unwrap();
    assert_eq!(h.api.server_queue(), vec!["a.nc", "b.nc", "c.nc"]);
}

#[tokio::test]
async fn test_bootstrap_retried_before_completion_advance() {
    let mut h = harness(MockApi::with_queue(&["a.nc", "b.nc"]));
    h.api.fail_next("/server/files", 1);
    assert!(h.queue.bootstrap().await.is_err());

    h.api.script([
        status(0.0, "EXECUTING", "a.nc"),
        status(0.0, "DONE", "a.nc"),
    ]);
    h.poller.tick().await;
    h.poller.tick().await;

    assert!(h.queue.view().await.in_sync());
    assert_eq!(h.api.server_queue(), vec!["b.nc"]);
    assert_eq!(h.api.opened(), vec!["a.nc", "b.nc"]);

    h.queue.enqueue("c.nc").await.unwrap();
    assert_eq!(h.api.server_queue(), vec!["b.nc", "c.nc"]);
}

#[tokio::test]
async fn test_failed_open_after_advance_is_retried() {
    let mut h = harness(MockApi::with_queue(&["a.nc", "b.nc"]));
    h.queue.bootstrap().await.unwrap();
    h.api.script([
        status(0.0, "EXECUTING", "a.nc"),
        status(0.0, "DONE", "a.nc"),
        status(0.0, "IDLE", "a.nc"),
    ]);

    h.poller.tick().await;
    h.api.fail_next("/machinekit/open_file", 1);
    h.poller.tick().await;

    let view = h.queue.view().await;
    assert_eq!(h.api.server_queue(), vec!["b.nc"]);
    assert_eq!(view.server, view.local);
    assert_eq!(view.pending, Some(monitor::PendingSync::Open));
    assert!(h.poller.subscribe().borrow().queue_sync_pending);

    h.poller.tick().await;
    assert!(h.queue.view().await.in_sync());
    assert_eq!(h.api.opened(), vec!["a.nc", "b.nc", "b.nc"]);
    assert_eq!(h.api.server_queue(), vec!["b.nc"]);
}

#[tokio::test]
async fn test_upload_rejects_unsupported_extension() {
    let h = harness(MockApi::new());
    let controls = h.poller.controls();

    let err = controls
        .upload(FileUpload::new("part.step", b"solid".to_vec()))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ApiError::Validation(ValidationError::UnsupportedExtension {
            file: "part.step".to_string(),
            allowed: vec!["nc".to_string(), "ngc".to_string(), "gcode".to_string()],
        })
    );
    assert_eq!(h.api.count("/server/file_upload"), 0);
}

#[tokio::test]
async fn test_upload_refreshes_listing() {
    let h = harness(MockApi::new());
    let controls = h.poller.controls();
    let uploads = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let seen = uploads.clone();
    h.bus.subscribe(
        EventFilter::Categories(vec![EventCategory::Queue]),
        move |event| {
            if let AppEvent::Queue(QueueEvent::FileUploaded { file }) = event {
                seen.lock().unwrap().push(file.clone());
            }
        },
    );

    let files = controls
        .upload(FileUpload::new("part.nc", b"G0 X0".to_vec()))
        .await
        .unwrap();

    assert_eq!(h.api.count("/server/file_upload"), 1);
    assert!(files.iter().any(|f| f.name == "part.nc"));
    assert_eq!(*uploads.lock().unwrap(), vec!["part.nc".to_string()]);
}

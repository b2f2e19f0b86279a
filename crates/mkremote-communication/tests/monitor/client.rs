use std::sync::Arc;

use mkremote_communication::MachineClient;
use mkremote_core::{
    ApiError, MachineCommand, ProgramCommand, RequestChannel, SpindleCommand, ValidationError,
};
use serde_json::json;

use crate::mock::{harness, status, MockApi};

async fn wait_for_call(api: &MockApi, path: &str) {
    while api.count(path) == 0 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_second_command_rejected_while_first_in_flight() {
    let api = Arc::new(MockApi::new());
    let client = Arc::new(MachineClient::new(api.clone()));
    let release = api.hold_next_post("/machinekit/program");

    let first = tokio::spawn({
        let client = client.clone();
        async move {
            client
                .execute(&MachineCommand::Program(ProgramCommand::Start))
                .await
        }
    });
    wait_for_call(&api, "/machinekit/program").await;
    assert!(client.is_busy(RequestChannel::Command));

    let second = client
        .execute(&MachineCommand::Program(ProgramCommand::Pause))
        .await;
    assert_eq!(
        second,
        Err(ApiError::RequestInFlight {
            channel: RequestChannel::Command
        })
    );
    assert_eq!(api.count("/machinekit/program"), 1);

    release.notify_one();
    assert!(first.await.unwrap().is_ok());
    assert!(!client.is_busy(RequestChannel::Command));

    assert!(client
        .execute(&MachineCommand::Program(ProgramCommand::Stop))
        .await
        .is_ok());
    assert_eq!(api.count("/machinekit/program"), 2);
}

#[tokio::test]
async fn test_channels_do_not_block_each_other() {
    let api = Arc::new(MockApi::new());
    api.script([status(0.0, "IDLE", "")]);
    let client = Arc::new(MachineClient::new(api.clone()));
    let release = api.hold_next_post("/machinekit/program");

    let first = tokio::spawn({
        let client = client.clone();
        async move {
            client
                .execute(&MachineCommand::Program(ProgramCommand::Start))
                .await
        }
    });
    wait_for_call(&api, "/machinekit/program").await;

    assert!(client.fetch_status().await.is_ok());
    assert!(client.open_file(Some("a.nc")).await.is_ok());

    release.notify_one();
    assert!(first.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_out_of_range_override_never_sent() {
    let api = Arc::new(MockApi::new());
    let client = MachineClient::new(api.clone());

    let err = client
        .execute(&MachineCommand::FeedOverride(1.5))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::Validation(ValidationError::OutOfRange { .. })
    ));
    assert!(api.calls().is_empty());

    client
        .execute(&MachineCommand::Spindle(SpindleCommand::Override(0.5)))
        .await
        .unwrap();
    let calls = api.calls();
    assert_eq!(calls[0].path, "/machinekit/spindle/override");
    assert_eq!(calls[0].body, json!({"spindle_override": 0.5}));
}

#[tokio::test]
async fn test_open_none_sends_empty_name() {
    let api = Arc::new(MockApi::new());
    let client = MachineClient::new(api.clone());

    client.open_file(None).await.unwrap();
    assert_eq!(api.calls()[0].body, json!({"name": ""}));
}

#[tokio::test]
async fn test_halcmd_goes_out_on_command_channel() {
    let h = harness(MockApi::new());
    let controls = h.poller.controls();

    assert_eq!(controls.halcmd("show pin").await.unwrap(), "ok");
    let calls = h.api.calls();
    assert_eq!(calls[0].path, "/machinekit/halcmd");
    assert_eq!(calls[0].body, json!({"halcmd": "show pin"}));

    assert!(controls.halcmd("  ").await.unwrap_err().is_validation());
    assert_eq!(h.api.count("/machinekit/halcmd"), 1);
}

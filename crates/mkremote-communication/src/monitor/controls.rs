//! User-facing controls
//!
//! Entry point for operator intents. Commands go straight to the client on
//! the command channel; queue edits go through the synchronizer. Every
//! successful state change requests an immediate fast poll, and every
//! failure is reported to the error list before it is returned.

use std::sync::Arc;

use mkremote_core::{
    AnnouncedError, ApiError, AppEvent, BrakeCommand, DirectionCommand, EventBus, HomeCommand,
    JogRequest, MachineCommand, MachineEvent, MachineStatusCommand, ProgramCommand, QueueEvent,
    ServerFile, SpindleCommand, SpindleSpeedStep, SpindleSwitch, ValidationError,
};
use serde_json::Value;
use tokio::sync::watch;

use super::poller::RefreshHandle;
use super::queue::QueueSynchronizer;
use super::reporter::ErrorReporter;
use super::state::MonitorState;
use crate::client::MachineClient;
use crate::transport::FileUpload;

/// Operator actions against the machine and the file queue
#[derive(Debug, Clone)]
pub struct MachineControls {
    client: Arc<MachineClient>,
    queue: Arc<QueueSynchronizer>,
    reporter: ErrorReporter,
    refresh: RefreshHandle,
    bus: Arc<EventBus>,
    state: watch::Receiver<MonitorState>,
}

impl MachineControls {
    pub(crate) fn new(
        client: Arc<MachineClient>,
        queue: Arc<QueueSynchronizer>,
        reporter: ErrorReporter,
        refresh: RefreshHandle,
        bus: Arc<EventBus>,
        state: watch::Receiver<MonitorState>,
    ) -> Self {
        Self {
            client,
            queue,
            reporter,
            refresh,
            bus,
            state,
        }
    }

    /// Latest published monitor state
    pub fn state(&self) -> MonitorState {
        self.state.borrow().clone()
    }

    /// Send a command; on success the next poll is fast
    pub async fn execute(&self, command: MachineCommand) -> Result<Value, ApiError> {
        let endpoint = command.endpoint(self.client.endpoints()).to_string();
        let result = self.client.execute(&command).await;
        self.settle(result, || {
            AppEvent::Machine(MachineEvent::CommandAccepted { endpoint })
        })
    }

    /// Power and e-stop
    pub async fn set_machine_status(
        &self,
        command: MachineStatusCommand,
    ) -> Result<Value, ApiError> {
        self.execute(MachineCommand::SetMachineStatus(command)).await
    }

    /// Engage the e-stop if released, release it if engaged
    pub async fn toggle_estop(&self) -> Result<Value, ApiError> {
        let engaged = self.last_power()?.estop_engaged;
        self.set_machine_status(if engaged {
            MachineStatusCommand::EStopReset
        } else {
            MachineStatusCommand::EStop
        })
        .await
    }

    /// Power off if on, on if off
    pub async fn toggle_power(&self) -> Result<Value, ApiError> {
        let enabled = self.last_power()?.enabled;
        self.set_machine_status(if enabled {
            MachineStatusCommand::PowerOff
        } else {
            MachineStatusCommand::PowerOn
        })
        .await
    }

    fn last_power(&self) -> Result<mkremote_core::PowerState, ApiError> {
        let power = self.state.borrow().snapshot.as_ref().map(|s| s.power);
        power.ok_or_else(|| {
            let err = ApiError::from(ValidationError::EmptyInput {
                field: "machine status".to_string(),
            });
            self.reporter.report(&err);
            err
        })
    }

    /// Jog one axis by `increment` at `speed`
    pub async fn jog(&self, axis: u32, speed: f64, increment: f64) -> Result<Value, ApiError> {
        self.execute(MachineCommand::Jog(JogRequest {
            axis,
            speed,
            increment,
        }))
        .await
    }

    /// Execute one MDI line
    pub async fn mdi(&self, line: impl Into<String>) -> Result<Value, ApiError> {
        self.execute(MachineCommand::Mdi(line.into())).await
    }

    /// Run an allow-listed HAL command, returning its output
    pub async fn halcmd(&self, line: impl Into<String>) -> Result<String, ApiError> {
        let body = self.execute(MachineCommand::Halcmd(line.into())).await?;
        Ok(body
            .get("success")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    /// Home every axis
    pub async fn home_all(&self) -> Result<Value, ApiError> {
        self.execute(MachineCommand::Home(HomeCommand::Home)).await
    }

    /// Unhome every axis
    pub async fn unhome_all(&self) -> Result<Value, ApiError> {
        self.execute(MachineCommand::Home(HomeCommand::Unhome)).await
    }

    /// Start, pause, stop or resume the loaded program
    pub async fn program(&self, command: ProgramCommand) -> Result<Value, ApiError> {
        self.execute(MachineCommand::Program(command)).await
    }

    /// Step the spindle speed
    pub async fn spindle_speed(&self, step: SpindleSpeedStep) -> Result<Value, ApiError> {
        self.execute(MachineCommand::Spindle(SpindleCommand::Speed(step)))
            .await
    }

    /// Engage or release the spindle brake
    pub async fn spindle_brake(&self, command: BrakeCommand) -> Result<Value, ApiError> {
        self.execute(MachineCommand::Spindle(SpindleCommand::Brake(command)))
            .await
    }

    /// Set the spindle direction
    pub async fn spindle_direction(&self, command: DirectionCommand) -> Result<Value, ApiError> {
        self.execute(MachineCommand::Spindle(SpindleCommand::Direction(command)))
            .await
    }

    /// Switch the spindle on or off
    pub async fn spindle_enabled(&self, command: SpindleSwitch) -> Result<Value, ApiError> {
        self.execute(MachineCommand::Spindle(SpindleCommand::Enabled(command)))
            .await
    }

    /// Set the spindle override ratio (0..=1)
    pub async fn spindle_override(&self, ratio: f64) -> Result<Value, ApiError> {
        self.execute(MachineCommand::Spindle(SpindleCommand::Override(ratio)))
            .await
    }

    /// Set the feed override ratio (0..=1.2)
    pub async fn feed_override(&self, ratio: f64) -> Result<Value, ApiError> {
        self.execute(MachineCommand::FeedOverride(ratio)).await
    }

    /// Set the maximum velocity
    pub async fn max_velocity(&self, units_per_minute: f64) -> Result<Value, ApiError> {
        self.execute(MachineCommand::MaxVelocity(units_per_minute))
            .await
    }

    /// Acknowledge a pending tool change
    pub async fn toolchange(&self) -> Result<Value, ApiError> {
        let endpoint = self.client.endpoints().toolchange.clone();
        let result = self.client.toolchange().await;
        self.settle(result, || {
            AppEvent::Machine(MachineEvent::CommandAccepted { endpoint })
        })
    }

    /// Append a file to the queue
    pub async fn enqueue(&self, file: impl Into<String>) -> Result<(), ApiError> {
        let result = self.queue.enqueue(file).await;
        self.settle_quiet(result)
    }

    /// Remove the queue entry at `index`
    pub async fn dequeue(&self, index: usize) -> Result<String, ApiError> {
        let result = self.queue.dequeue(index).await;
        self.settle_quiet(result)
    }

    /// Reorder the queue
    pub async fn reorder(&self, new_order: Vec<String>) -> Result<(), ApiError> {
        let result = self.queue.reorder(new_order).await;
        self.settle_quiet(result)
    }

    /// Upload a file, then refresh the file listing
    pub async fn upload(&self, file: FileUpload) -> Result<Vec<ServerFile>, ApiError> {
        let file_name = file.file_name.clone();
        if let Err(err) = self.client.upload_file(file).await {
            self.reporter.report(&err);
            return Err(err);
        }
        tracing::info!("Uploaded {}", file_name);
        self.bus
            .publish(AppEvent::Queue(QueueEvent::FileUploaded { file: file_name }))
            .ok();

        let listing = self.queue.refresh_listing().await;
        self.settle_quiet(listing)
    }

    /// Dismiss a displayed error
    pub fn dismiss_error(&self, index: usize) -> Result<AnnouncedError, ValidationError> {
        self.reporter.dismiss(index)
    }

    /// Ask for a fast poll right away
    pub fn refresh_now(&self) {
        self.refresh.request();
    }

    fn settle<T>(
        &self,
        result: Result<T, ApiError>,
        accepted: impl FnOnce() -> AppEvent,
    ) -> Result<T, ApiError> {
        if result.is_ok() {
            self.bus.publish(accepted()).ok();
        }
        self.settle_quiet(result)
    }

    fn settle_quiet<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        match &result {
            Ok(_) => self.refresh.request(),
            Err(err) => {
                self.reporter.report(err);
            }
        }
        result
    }
}

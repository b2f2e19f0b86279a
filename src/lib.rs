//! # mkremote
//!
//! A headless remote for Machinekit/LinuxCNC machines driven through the
//! controller's REST bridge:
//! - Adaptive status polling (fast while moving, slow while idle, long
//!   backoff while the bridge or controller is down)
//! - A file queue kept in step with the queue the bridge persists
//! - Typed machine commands with single-flight protection
//!
//! ## Architecture
//!
//! mkremote is organized as a workspace with multiple crates:
//!
//! 1. **mkremote-core** - Error taxonomy, status model, display model, event bus
//! 2. **mkremote-communication** - HTTP transport, typed client, status monitor
//! 3. **mkremote-settings** - Configuration file and persisted view state
//! 4. **mkremote** - Main binary that integrates all crates

pub use mkremote_core::{data, event_bus};

pub use mkremote_core::{
    ApiError, AppEvent, DisplayModel, Endpoints, Error, EventBus, FileQueue, MachineCommand,
    OperationalCondition, PollMode, Result, StatusSnapshot, ValidationError, ViewMode,
};

pub use mkremote_communication::{
    monitor, AdaptivePoller, HttpTransport, MachineApi, MachineClient, MachineControls,
    MonitorHandle, MonitorState, PollIntervals, QueueSynchronizer, TransportConfig, UploadPolicy,
};

pub use mkremote_settings::{Config, SelectedView, ViewState, ViewStatePersistence};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging with:
/// - RUST_LOG environment variable support (INFO when unset)
/// - Human-readable output with target and line numbers, or one JSON
///   object per line when `json` is set
pub fn init_logging(json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (json_layer, text_layer) = if json {
        let layer = fmt::layer()
            .json()
            .with_writer(std::io::stdout)
            .with_target(true)
            .with_line_number(true);
        (Some(layer), None)
    } else {
        let layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(true)
            .with_level(true)
            .with_thread_names(true)
            .with_line_number(true);
        (None, Some(layer))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()?;

    Ok(())
}

/// One-line summary of a monitor state for the log
pub fn summarize(state: &MonitorState) -> String {
    let display = &state.display;
    if let Some(banner) = &display.banner {
        return format!("[{}] {}", state.condition.label(), banner);
    }

    let axes = display
        .axes
        .iter()
        .map(|row| format!("{}={}", row.name, row.text))
        .collect::<Vec<_>>()
        .join(" ");
    let mut line = format!(
        "{} | {} | {} | file={} | queue={}",
        if display.power_on { "power on" } else { "power off" },
        display.interpreter.unwrap_or("-"),
        if axes.is_empty() { "no axes" } else { axes.as_str() },
        display.current_file.as_deref().unwrap_or("-"),
        state.queue.len(),
    );
    if state.queue_sync_pending {
        line.push_str(" (sync pending)");
    }
    if !state.errors.is_empty() {
        line.push_str(&format!(" | errors: {}", state.errors.join("; ")));
    }
    line
}

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use mkremote::event_bus::recv_next;
use mkremote::{
    init_logging, monitor, summarize, AdaptivePoller, AppEvent, Config, EventBus, HttpTransport,
    MachineClient, QueueSynchronizer, ViewStatePersistence, BUILD_DATE, VERSION,
};

/// Headless Machinekit remote: polls the controller bridge, keeps the file
/// queue in sync, and logs what a display would show.
#[derive(Debug, Parser)]
#[command(name = "mkremote", version)]
struct Cli {
    /// Configuration file (.toml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bridge base URL, overrides the configuration file
    #[arg(long)]
    base_url: Option<String>,

    /// API key, overrides the configuration file
    #[arg(long)]
    api_key: Option<String>,

    /// Log one JSON object per line
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json)?;
    tracing::info!("mkremote {} (built {})", VERSION, BUILD_DATE);

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let mut config = Config::load_or_default(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    if let Some(base_url) = cli.base_url {
        config.connection.base_url = base_url;
    }
    if let Some(api_key) = cli.api_key {
        config.connection.api_key = Some(api_key);
    }
    config.validate()?;

    let view = ViewStatePersistence::in_config_dir()
        .map(|store| store.load())
        .unwrap_or_default();
    tracing::info!("Starting in {} view", view.view);

    let transport = HttpTransport::new(config.transport_config())?;
    tracing::info!("Connecting to {}", config.connection.base_url);

    let client = Arc::new(MachineClient::with_options(
        Arc::new(transport),
        config.endpoints.clone(),
        config.upload_policy(),
    ));
    let bus = Arc::new(EventBus::new());
    let mut events = bus.receiver();
    let queue = Arc::new(QueueSynchronizer::new(client.clone(), bus.clone()));
    let poller = AdaptivePoller::new(client, queue.clone(), bus, config.poll_intervals());

    if let Err(e) = queue.bootstrap().await {
        tracing::warn!("Could not load the file queue, retrying once the bridge answers: {}", e);
    }

    let handle = monitor::spawn(poller);
    let mut state = handle.state();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result?;
                tracing::info!("Interrupted, shutting down");
                break;
            }
            event = recv_next(&mut events) => match event {
                Some(event) => log_event(&event),
                None => break,
            },
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let line = summarize(&state.borrow_and_update());
                tracing::info!(target: "mkremote::display", "{}", line);
            }
        }
    }

    handle.stop().await?;
    Ok(())
}

fn log_event(event: &AppEvent) {
    match event {
        AppEvent::Error(_) => tracing::warn!(category = %event.category(), "{}", event.description()),
        _ => tracing::debug!(category = %event.category(), "{}", event.description()),
    }
}

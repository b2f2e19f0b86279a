//! # mkremote Communication
//!
//! Talks to a Machinekit REST bridge: the transport seam and its reqwest
//! implementation, single-flight gates, typed endpoints, the error
//! classifier, upload validation, and the status monitor (adaptive poll
//! loop plus file-queue synchronizer).

pub mod classifier;
pub mod client;
pub mod monitor;
pub mod transport;
pub mod upload;

pub use classifier::{classify, classify_message};
pub use client::{decode_status, MachineClient};
pub use monitor::{
    AdaptivePoller, MachineControls, MonitorHandle, MonitorState, PollIntervals,
    QueueSynchronizer, QueueView, RefreshHandle,
};
pub use transport::{FileUpload, HttpTransport, MachineApi, SingleFlight, TransportConfig};
pub use upload::UploadPolicy;

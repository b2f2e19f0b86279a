//! Single-flight gates
//!
//! One gate per mutating request channel. A second request while the first
//! is outstanding is rejected immediately with
//! [`ApiError::RequestInFlight`]; it is never queued.

use std::sync::atomic::{AtomicBool, Ordering};

use mkremote_core::{ApiError, RequestChannel};

/// Single-slot gate for one request channel
#[derive(Debug)]
pub struct SingleFlight {
    channel: RequestChannel,
    busy: AtomicBool,
}

impl SingleFlight {
    /// Create an open gate for `channel`
    pub fn new(channel: RequestChannel) -> Self {
        Self {
            channel,
            busy: AtomicBool::new(false),
        }
    }

    /// Claim the gate
    ///
    /// The returned guard releases the gate when dropped, whichever way the
    /// request ends.
    pub fn try_acquire(&self) -> Result<InFlightGuard<'_>, ApiError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                tracing::debug!("Rejected {} request: gate busy", self.channel);
                ApiError::RequestInFlight {
                    channel: self.channel,
                }
            })?;
        Ok(InFlightGuard { gate: self })
    }

    /// Check if a request is outstanding
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Channel this gate guards
    pub fn channel(&self) -> RequestChannel {
        self.channel
    }
}

/// Proof that a request holds its channel's gate
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    gate: &'a SingleFlight,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}

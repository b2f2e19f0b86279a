//! Events emitted by the status monitor and the bus that carries them.
//!
//! Handlers registered with [`EventBus::subscribe`] run inline on the
//! publisher; async consumers take a [`EventBus::receiver`] and drain it with
//! [`recv_next`].
//!
//! ```rust,ignore
//! let bus = EventBus::new();
//! let id = bus.subscribe(EventFilter::Categories(vec![EventCategory::Link]), |event| {
//!     tracing::info!("{}", event.description())
//! });
//! bus.unsubscribe(id);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;

//! Event codec.
//!
//! The client side turns a dispatched DOM event into a [`SerializedEvent`]
//! and routes it upstream, immediately or through the pointer-motion
//! [`Debouncer`]. The server side rebuilds a synthetic [`Event`] and
//! dispatches it against the authoritative tree, running the side effects a
//! synthetic event cannot produce on its own.
//!
//! [`SerializedEvent`]: wsdom_protocols::SerializedEvent
//! [`Event`]: wsdom_dom::Event

mod capture;
mod debounce;
mod simulate;

pub use capture::{serialize_event, EventCapture};
pub use debounce::Debouncer;
pub use simulate::{click, dispatch_client_event, reconstruct_event};

/// Default trailing-edge window for pointer-motion events.
pub const DEFAULT_DEBOUNCE_MS: u64 = 250;

/// Milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}

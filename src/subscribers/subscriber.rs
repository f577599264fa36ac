//! # Core subscriber trait
//!
//! `Subscriber` is the extension point for plugging event handlers into the bus.
//! A [`SubscriptionManager`](crate::SubscriptionManager) drives each subscriber from a
//! dedicated receive loop fed by the subscriber's delivery channel.
//!
//! ## Contract
//! - `id()` is stable, non-empty and unique among live subscribers of one streamer.
//! - `process()` runs once per delivered event, never in the publisher's context.
//!   A handler that never returns stalls only its own queue; the channel's
//!   backpressure policy decides what happens to later events.
//! - `connected()` runs once, after the channel is live and the receive loop started.
//! - `disconnected()` runs once, after the channel is closed and the loop finished.
//!
//! ## Example (skeleton)
//! ```rust
//! use async_trait::async_trait;
//! use streambus::{Event, Subscriber};
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl Subscriber for Audit {
//!     fn id(&self) -> &str { "audit" }
//!
//!     async fn process(&self, event: &Event) {
//!         if event.is("error") {
//!             // write audit record...
//!         }
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// Called from a subscriber-dedicated receive loop. Implementations should avoid
/// blocking the async runtime (prefer async I/O and cooperative waits).
#[async_trait]
pub trait Subscriber: Send + Sync + 'static {
    /// Identity used to register with the streamer.
    fn id(&self) -> &str;

    /// Handle a single event.
    ///
    /// Panics are caught and logged; the receive loop keeps running.
    async fn process(&self, event: &Event);

    /// Called once the subscription is live.
    async fn connected(&self) {}

    /// Called once the subscription has been torn down.
    async fn disconnected(&self) {}
}

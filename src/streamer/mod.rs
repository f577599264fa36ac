//! Broadcast registry: subscriber channels and event fan-out.
//!
//! ## Contents
//! - [`Streamer`] contract (subscribe / unsubscribe / publish)
//! - [`DefaultStreamer`] in-process implementation over `tokio::sync::RwLock`
//! - [`Delivery`] receiving half of a subscriber's channel
//! - [`Registration`] identity of one channel, for releasing exactly that one
//! - [`PublishReport`] per-call delivery summary
//!
//! ## Quick reference
//! - **Producers** call [`Streamer::publish`].
//! - **Subscription managers** call `subscribe`/`unsubscribe` and drain the [`Delivery`].
//! - **Backpressure** is configured per streamer via [`Config`](crate::Config).

mod api;
mod delivery;
mod registry;

pub use api::{PublishReport, Streamer};
pub use delivery::{Delivery, Registration};
pub use registry::DefaultStreamer;

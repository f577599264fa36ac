//! # Event subscribers for the bus.
//!
//! This module provides the [`Subscriber`] trait, the [`SubscriptionManager`] that
//! binds a subscriber to a [`Streamer`](crate::Streamer), and the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Producer ── publish(Event) ──► Streamer ──► [delivery channel per subscriber]
//!                                                   │
//!                                                   └──► SubscriptionManager receive loop
//!                                                             │
//!                                                             └──► Subscriber::process(&Event)
//!                                                                       │
//!                                                                  ┌────┴────┬─────────┐
//!                                                                  ▼         ▼         ▼
//!                                                               LogWriter  Metrics  Custom ...
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use streambus::{Config, DefaultStreamer, Event, Subscriber, SubscriptionManager};
//!
//! struct Counter;
//!
//! #[async_trait]
//! impl Subscriber for Counter {
//!     fn id(&self) -> &str { "counter" }
//!     async fn process(&self, event: &Event) {
//!         // increment a counter for event.category()
//!     }
//! }
//!
//! # async fn wire() -> Result<(), streambus::BusError> {
//! let streamer = DefaultStreamer::shared(&Config::default());
//! let manager = SubscriptionManager::new(streamer.clone(), Arc::new(Counter));
//! manager.subscribe().await?;
//! // ...
//! manager.unsubscribe().await;
//! # Ok(())
//! # }
//! ```

mod log;
mod manager;
mod subscriber;

pub use log::LogWriter;
pub use manager::{SubscriptionManager, SubscriptionManagerBuilder, connect};
pub use subscriber::Subscriber;

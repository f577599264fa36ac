//! # streambus
//!
//! **streambus** is an in-process event broadcast bus for async Rust.
//!
//! Publishers emit [`Event`]s, independent [`Subscriber`]s receive them on their own
//! tasks, and a [`SubscriptionManager`] binds each subscriber's lifecycle
//! (connect/disconnect) to the bus.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Producer A  │   │  Producer B  │   │ Termination  │
//!     │              │   │              │   │   helper     │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │ publish(Event)   │                  │ publish(shutdown)
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  DefaultStreamer (broadcast registry)                             │
//! │  - RwLock<HashMap<id, Channel>>                                   │
//! │  - publish: snapshot under read lock, deliver after release       │
//! │  - BackpressurePolicy per channel (Block/DropNewest/DropOldest/…) │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   [queue "log"]      [queue "metrics"]   [queue "custom"]     (bounded, one per subscriber)
//!        │                  │                  │
//!        ▼                  ▼                  ▼
//!   receive loop        receive loop       receive loop         (SubscriptionManager)
//!        │                  │                  │
//!        ▼                  ▼                  ▼
//!   LogWriter.process   sub.process        sub.process          (panics caught)
//! ```
//!
//! ### Lifecycle
//! ```text
//! SubscriptionManager::subscribe()
//!   ├─► Streamer::subscribe(id)   ── Err(AlreadySubscribed) ─► returned, nothing started
//!   ├─► spawn receive loop (Dispatch::Sequential | Dispatch::Concurrent { n })
//!   └─► Subscriber::connected()
//!
//! SubscriptionManager::unsubscribe()
//!   ├─► Streamer::unsubscribe(id)  (channel closed, reader sees end-of-stream)
//!   ├─► join receive loop (bounded by Config::drain_timeout)
//!   └─► Subscriber::disconnected()
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Events**        | Immutable events with typed payloads.                         | [`Event`], [`Payload`]                      |
//! | **Categories**    | Registry of known category tags, fail-fast on collisions.     | [`Category`], [`CategoryRegistry`]          |
//! | **Broadcast**     | Subscriber channels and fan-out with backpressure.            | [`Streamer`], [`DefaultStreamer`]           |
//! | **Subscriptions** | Receive loops and lifecycle callbacks.                        | [`Subscriber`], [`SubscriptionManager`]     |
//! | **Policies**      | Queue overflow and handler dispatch behavior.                 | [`BackpressurePolicy`], [`Dispatch`]        |
//! | **Shutdown**      | Shutdown event on OS signal or cancellation.                  | [`shutdown`]                                |
//! | **Errors**        | Typed errors for wiring and malformed events.                 | [`BusError`]                                |
//! | **Configuration** | Centralized settings.                                         | [`Config`]                                  |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use streambus::{Config, DefaultStreamer, Event, Streamer, Subscriber, SubscriptionManager};
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl Subscriber for Printer {
//!     fn id(&self) -> &str { "printer" }
//!     async fn process(&self, event: &Event) {
//!         println!("{event}");
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let streamer = DefaultStreamer::shared(&Config::default());
//!
//!     let manager = SubscriptionManager::new(streamer.clone(), Arc::new(Printer));
//!     manager.subscribe().await?;
//!
//!     streamer.publish(Event::info("sys", "started")?).await;
//!
//!     manager.unsubscribe().await;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod events;
mod policies;
mod streamer;
mod subscribers;

pub mod shutdown;

// ---- Public re-exports ----

pub use config::Config;
pub use error::BusError;
pub use events::category;
pub use events::{Category, CategoryRegistry, Event, Payload};
pub use policies::{BackpressurePolicy, Dispatch};
pub use streamer::{DefaultStreamer, Delivery, PublishReport, Registration, Streamer};
pub use subscribers::{
    LogWriter, Subscriber, SubscriptionManager, SubscriptionManagerBuilder, connect,
};

//! Delivery and dispatch policies.
//!
//! This module groups the knobs that control **what publish does** when a
//! subscriber falls behind and **how** a subscriber's receive loop hands events
//! to its handler.
//!
//! ## Contents
//! - [`BackpressurePolicy`] what to do when a subscriber's queue is full
//! - [`Dispatch`] sequential worker or bounded pool per subscriber
//!
//! ## Quick wiring
//! ```text
//! Config { queue_capacity, backpressure, dispatch, .. }
//!      ├─► DefaultStreamer uses backpressure + queue_capacity per delivery channel
//!      └─► SubscriptionManager uses dispatch in the receive loop
//! ```
//!
//! ## Defaults
//! - `BackpressurePolicy::DropNewest`: a full queue drops the new event for that subscriber only.
//! - `Dispatch::Sequential`: one ordered worker per subscriber (FIFO).

mod backpressure;
mod dispatch;

pub use backpressure::BackpressurePolicy;
pub use dispatch::Dispatch;

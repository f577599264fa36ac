//! # Streamer contract.
//!
//! [`Streamer`] is the seam between producers, subscription managers and the
//! broadcast registry. [`DefaultStreamer`](crate::DefaultStreamer) is the
//! in-process implementation; tests and adapters may provide their own.

use std::sync::Arc;

use async_trait::async_trait;

use super::delivery::{Delivery, Registration};
use crate::error::BusError;
use crate::events::Event;

/// Summary of a single [`Streamer::publish`] call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers whose queue accepted the event.
    pub delivered: usize,
    /// Subscribers that did not get the event (queue full or wait timed out).
    pub dropped: Vec<Arc<str>>,
}

impl PublishReport {
    /// Returns `true` if no subscriber lost the event.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.dropped.is_empty()
    }
}

/// Broadcast registry: live subscriber channels and event fan-out.
///
/// ### Contract
/// - `subscribe` inserts a channel for a new id or fails without changing anything.
/// - `unsubscribe` closes and removes a channel; unknown ids are a no-op.
/// - `release` does the same, but only for the channel a [`Registration`] was issued for.
/// - `publish` delivers exactly one copy to each subscriber registered when the call starts.
#[async_trait]
pub trait Streamer: Send + Sync + 'static {
    /// Opens a delivery channel for `id`.
    ///
    /// # Errors
    /// - [`BusError::AlreadySubscribed`] if `id` has a live registration;
    /// - [`BusError::EmptySubscriberId`] if `id` is empty.
    async fn subscribe(&self, id: &str) -> Result<Delivery, BusError>;

    /// Closes and removes the channel for `id`.
    ///
    /// Returns `true` if a registration was removed.
    async fn unsubscribe(&self, id: &str) -> bool;

    /// Closes and removes the channel `registration` was issued for.
    ///
    /// Returns `false` if that channel is already closed, including when its id has
    /// since been subscribed again by someone else.
    ///
    /// The default relies on the closed flag alone; implementations that can compare
    /// channel identity should override it.
    async fn release(&self, registration: &Registration) -> bool {
        if registration.is_closed() {
            return false;
        }
        self.unsubscribe(registration.id()).await
    }

    /// Fans `event` out to every registered subscriber.
    async fn publish(&self, event: Event) -> PublishReport;
}

#[async_trait]
impl<S: Streamer + ?Sized> Streamer for Arc<S> {
    async fn subscribe(&self, id: &str) -> Result<Delivery, BusError> {
        (**self).subscribe(id).await
    }

    async fn unsubscribe(&self, id: &str) -> bool {
        (**self).unsubscribe(id).await
    }

    async fn release(&self, registration: &Registration) -> bool {
        (**self).release(registration).await
    }

    async fn publish(&self, event: Event) -> PublishReport {
        (**self).publish(event).await
    }
}

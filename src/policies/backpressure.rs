//! # Backpressure policies for delivery channels.
//!
//! [`BackpressurePolicy`] decides what [`publish`](crate::Streamer::publish) does when a
//! subscriber's bounded queue has no room for another event.
//!
//! - [`BackpressurePolicy::Block`] waits until the queue admits the event.
//! - [`BackpressurePolicy::DropNewest`] drops the new event for that subscriber (default).
//! - [`BackpressurePolicy::DropOldest`] overwrites the oldest undelivered event.
//! - [`BackpressurePolicy::Timeout`] waits up to a deadline, then drops.
//!
//! ## Choosing the right policy
//!
//! **Observers** (logs, metrics, UIs):
//! ```text
//! DropNewest      → slow observer loses events, publishers never wait
//! DropOldest      → slow observer always sees the most recent events
//! ```
//!
//! **Consumers that must see every event**:
//! ```text
//! Block           → publisher waits for the slowest subscriber
//! Timeout(d)      → publisher waits at most d per subscriber
//! ```
//!
//! A blocked or timed wait ends early when the target subscriber unsubscribes.
//! The wait happens after the registry lock is released, so it never holds up
//! `subscribe`/`unsubscribe`.

use std::time::Duration;

/// Policy controlling delivery into a full subscriber queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackpressurePolicy {
    /// Wait until the subscriber's queue admits the event.
    ///
    /// A subscriber that stops draining stalls every `publish` call that targets it.
    Block,
    /// Drop the new event for this subscriber only (default).
    DropNewest,
    /// Keep the newest events: the oldest undelivered ones are overwritten and skipped by the reader.
    DropOldest,
    /// Wait up to the given duration for room, then drop for this subscriber only.
    Timeout(Duration),
}

impl Default for BackpressurePolicy {
    /// Returns [`BackpressurePolicy::DropNewest`].
    fn default() -> Self {
        BackpressurePolicy::DropNewest
    }
}

impl BackpressurePolicy {
    /// Returns `true` if publish may suspend on this policy.
    pub fn may_wait(&self) -> bool {
        matches!(self, BackpressurePolicy::Block | BackpressurePolicy::Timeout(_))
    }

    /// Returns `true` if events can be lost under this policy.
    pub fn is_lossy(&self) -> bool {
        !matches!(self, BackpressurePolicy::Block)
    }

    /// Returns a short stable label for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BackpressurePolicy::Block => "block",
            BackpressurePolicy::DropNewest => "drop_newest",
            BackpressurePolicy::DropOldest => "drop_oldest",
            BackpressurePolicy::Timeout(_) => "timeout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_drop_newest() {
        assert_eq!(BackpressurePolicy::default(), BackpressurePolicy::DropNewest);
    }

    #[test]
    fn test_waiting_policies() {
        assert!(BackpressurePolicy::Block.may_wait());
        assert!(BackpressurePolicy::Timeout(Duration::from_millis(5)).may_wait());
        assert!(!BackpressurePolicy::DropNewest.may_wait());
        assert!(!BackpressurePolicy::DropOldest.may_wait());
    }

    #[test]
    fn test_only_block_is_lossless() {
        assert!(!BackpressurePolicy::Block.is_lossy());
        assert!(BackpressurePolicy::DropNewest.is_lossy());
        assert!(BackpressurePolicy::DropOldest.is_lossy());
        assert!(BackpressurePolicy::Timeout(Duration::ZERO).is_lossy());
    }
}

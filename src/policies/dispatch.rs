//! # Dispatch modes for subscriber receive loops.
//!
//! [`Dispatch`] decides how a [`SubscriptionManager`](crate::SubscriptionManager) hands
//! events from the delivery channel to [`Subscriber::process`](crate::Subscriber::process).
//!
//! ```text
//! Sequential:             delivery ──► worker ──► process(e1) ──► process(e2) ──► ...
//!
//! Concurrent { n }:       delivery ──► loop ──┬─► task ──► process(e1)
//!                                             ├─► task ──► process(e2)     (≤ n in flight)
//!                                             └─► ...
//! ```
//!
//! Sequential dispatch keeps per-subscriber FIFO order. Concurrent dispatch trades
//! ordering for throughput; when `n` handlers are in flight the loop stops draining
//! and the backpressure policy of the delivery channel takes over.

/// How a receive loop invokes the subscriber's handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// One event at a time, in delivery order (default).
    Sequential,
    /// Each event on its own task, at most `max_in_flight` at once (clamped to 1).
    Concurrent {
        /// Upper bound on handlers running at the same time.
        max_in_flight: usize,
    },
}

impl Default for Dispatch {
    /// Returns [`Dispatch::Sequential`].
    fn default() -> Self {
        Dispatch::Sequential
    }
}

impl Dispatch {
    /// Returns the number of handlers that may run at once.
    #[inline]
    pub fn parallelism(&self) -> usize {
        match self {
            Dispatch::Sequential => 1,
            Dispatch::Concurrent { max_in_flight } => (*max_in_flight).max(1),
        }
    }

    /// Returns `true` if events are processed in delivery order.
    #[inline]
    pub fn is_ordered(&self) -> bool {
        matches!(self, Dispatch::Sequential)
    }
}

//! # Global bus configuration.
//!
//! Provides [`Config`] centralized settings for the streamer, subscription managers
//! and the termination helper.
//!
//! Config is used in three places:
//! 1. **Streamer creation**: `DefaultStreamer::new(&config)` (queue capacity, backpressure)
//! 2. **Manager creation**: `SubscriptionManager::builder().with_config(config)` (dispatch, drain timeout)
//! 3. **Termination**: `shutdown::wait_for_termination(.., config.grace)`
//!
//! ## Sentinel values
//! - `queue_capacity = 0` → clamped to 1
//! - `queue_capacity > Config::MAX_QUEUE_CAPACITY` → clamped to the maximum
//! - `drain_timeout = 0s` → unsubscribe waits for in-flight handlers without limit

use std::time::Duration;

use crate::policies::{BackpressurePolicy, Dispatch};

/// Global configuration for the bus.
///
/// ## Field semantics
/// - `queue_capacity`: Per-subscriber delivery queue size (`1..=MAX_QUEUE_CAPACITY`)
/// - `backpressure`: What publish does when a queue is full
/// - `dispatch`: How a receive loop invokes the subscriber's handler
/// - `drain_timeout`: How long unsubscribe waits for in-flight handlers (`0s` = no limit)
/// - `grace`: Pause after publishing the shutdown event so subscribers can drain
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of each subscriber's delivery queue.
    ///
    /// Clamped to `1..=Config::MAX_QUEUE_CAPACITY` by the streamer.
    pub queue_capacity: usize,

    /// Delivery behavior when a subscriber's queue is full.
    pub backpressure: BackpressurePolicy,

    /// Handler invocation mode for subscription managers.
    pub dispatch: Dispatch,

    /// Maximum time unsubscribe waits for the receive loop to finish.
    ///
    /// When exceeded, the receive loop is aborted and a warning is logged.
    pub drain_timeout: Duration,

    /// Time to wait after the shutdown event is published.
    pub grace: Duration,
}

impl Config {
    /// Largest per-subscriber queue the streamer will open.
    ///
    /// Bounded queues are backed by a tokio semaphore, which cannot hold more permits.
    pub const MAX_QUEUE_CAPACITY: usize = tokio::sync::Semaphore::MAX_PERMITS;

    /// Returns the queue capacity clamped to `1..=MAX_QUEUE_CAPACITY`.
    #[inline]
    pub fn queue_capacity_clamped(&self) -> usize {
        self.queue_capacity.clamp(1, Self::MAX_QUEUE_CAPACITY)
    }

    /// Returns the drain timeout as an `Option`.
    ///
    /// - `None` → wait without limit
    /// - `Some(d)` → abort the receive loop after `d`
    #[inline]
    pub fn drain_limit(&self) -> Option<Duration> {
        if self.drain_timeout == Duration::ZERO {
            None
        } else {
            Some(self.drain_timeout)
        }
    }
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`, for log fields.
pub(crate) fn saturating_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `queue_capacity = 1024`
    /// - `backpressure = BackpressurePolicy::DropNewest`
    /// - `dispatch = Dispatch::Sequential`
    /// - `drain_timeout = 5s`
    /// - `grace = 2s`
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            backpressure: BackpressurePolicy::default(),
            dispatch: Dispatch::default(),
            drain_timeout: Duration::from_secs(5),
            grace: Duration::from_secs(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.queue_capacity, 1024);
        assert_eq!(cfg.backpressure, BackpressurePolicy::DropNewest);
        assert_eq!(cfg.dispatch, Dispatch::Sequential);
        assert_eq!(cfg.grace, Duration::from_secs(2));
    }

    #[test]
    fn test_sentinels() {
        let cfg = Config {
            queue_capacity: 0,
            drain_timeout: Duration::ZERO,
            ..Config::default()
        };
        assert_eq!(cfg.queue_capacity_clamped(), 1);
        assert_eq!(cfg.drain_limit(), None);
        assert_eq!(Config::default().drain_limit(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_saturating_millis() {
        assert_eq!(saturating_millis(Duration::from_millis(1500)), 1500);
        assert_eq!(saturating_millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_queue_capacity_upper_bound() {
        let cfg = Config {
            queue_capacity: usize::MAX,
            ..Config::default()
        };
        assert_eq!(cfg.queue_capacity_clamped(), Config::MAX_QUEUE_CAPACITY);
        assert_eq!(Config::default().queue_capacity_clamped(), 1024);
    }
}

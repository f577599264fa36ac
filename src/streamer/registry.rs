//! # Default streamer - in-process broadcast registry.
//!
//! [`DefaultStreamer`] maps subscriber ids to delivery channels and fans each
//! published event out to all of them.
//!
//! ## Architecture
//! ```text
//! subscribe(id)    ──► write lock ──► insert id → Channel      (AlreadySubscribed if present)
//! unsubscribe(id)  ──► write lock ──► remove id, Channel::close (no-op if absent)
//! release(reg)     ──► write lock ──► same, only if id still maps to reg's channel
//! publish(event)   ──► read lock  ──► snapshot [(id, Channel)]
//!                                      └─► release lock
//!                                           └─► deliver to all targets concurrently
//!                                                ├─► Delivered
//!                                                ├─► Dropped  (warn, reported)
//!                                                └─► Closed   (unsubscribed meanwhile)
//! ```
//!
//! ## Rules
//! - The map is mutated only by `subscribe`/`unsubscribe` under the write lock.
//! - `publish` only reads the map; concurrent publishes proceed in parallel.
//! - Delivery happens after the read lock is released, so a slow subscriber delays
//!   at most the publishes that target it and never `subscribe`/`unsubscribe`.
//! - Each subscriber registered when `publish` takes its snapshot gets exactly one copy.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::api::{PublishReport, Streamer};
use super::delivery::{self, Channel, Delivery, Outcome, Registration};
use crate::config::Config;
use crate::error::BusError;
use crate::events::Event;
use crate::policies::BackpressurePolicy;

/// In-process broadcast registry.
pub struct DefaultStreamer {
    channels: RwLock<HashMap<Arc<str>, Arc<Channel>>>,
    capacity: usize,
    backpressure: BackpressurePolicy,
}

impl DefaultStreamer {
    /// Creates a streamer using the queue capacity and backpressure policy of `cfg`.
    #[must_use]
    pub fn new(cfg: &Config) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            capacity: cfg.queue_capacity_clamped(),
            backpressure: cfg.backpressure,
        }
    }

    /// Creates a streamer behind an `Arc`, ready to share with producers and managers.
    #[must_use]
    pub fn shared(cfg: &Config) -> Arc<Self> {
        Arc::new(Self::new(cfg))
    }

    /// The backpressure policy applied to every channel.
    #[inline]
    pub fn backpressure(&self) -> BackpressurePolicy {
        self.backpressure
    }

    /// Number of live registrations.
    pub async fn subscriber_count(&self) -> usize {
        self.channels.read().await.len()
    }

    /// Returns `true` if `id` has a live registration.
    pub async fn is_subscribed(&self, id: &str) -> bool {
        self.channels.read().await.contains_key(id)
    }

    /// Returns sorted list of subscribed ids.
    pub async fn subscribers(&self) -> Vec<String> {
        let channels = self.channels.read().await;
        let mut ids: Vec<String> = channels.keys().map(|id| id.to_string()).collect();
        ids.sort_unstable();
        ids
    }

    /// Closes every channel and clears the registry.
    ///
    /// Returns the number of registrations removed.
    pub async fn close_all(&self) -> usize {
        let mut channels = self.channels.write().await;
        for channel in channels.values() {
            channel.close();
        }
        let n = channels.len();
        channels.clear();
        n
    }
}

impl Default for DefaultStreamer {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl std::fmt::Debug for DefaultStreamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultStreamer")
            .field("capacity", &self.capacity)
            .field("backpressure", &self.backpressure)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Streamer for DefaultStreamer {
    async fn subscribe(&self, id: &str) -> Result<Delivery, BusError> {
        if id.is_empty() {
            return Err(BusError::EmptySubscriberId);
        }

        let mut channels = self.channels.write().await;
        if channels.contains_key(id) {
            return Err(BusError::AlreadySubscribed { id: id.to_owned() });
        }

        let id: Arc<str> = Arc::from(id);
        let (channel, delivery) =
            delivery::channel(Arc::clone(&id), self.capacity, self.backpressure);
        channels.insert(Arc::clone(&id), Arc::new(channel));
        debug!(subscriber = %id, subscribers = channels.len(), "channel opened");
        Ok(delivery)
    }

    async fn unsubscribe(&self, id: &str) -> bool {
        let mut channels = self.channels.write().await;
        match channels.remove(id) {
            Some(channel) => {
                channel.close();
                debug!(subscriber = id, subscribers = channels.len(), "channel closed");
                true
            }
            None => false,
        }
    }

    async fn release(&self, registration: &Registration) -> bool {
        let mut channels = self.channels.write().await;
        let issued = channels
            .get(registration.id())
            .is_some_and(|channel| channel.is_issued(registration));
        if !issued {
            return false;
        }
        if let Some(channel) = channels.remove(registration.id()) {
            channel.close();
        }
        debug!(subscriber = registration.id(), subscribers = channels.len(), "channel released");
        true
    }

    async fn publish(&self, event: Event) -> PublishReport {
        let targets: Vec<(Arc<str>, Arc<Channel>)> = {
            let channels = self.channels.read().await;
            channels
                .iter()
                .map(|(id, ch)| (Arc::clone(id), Arc::clone(ch)))
                .collect()
        };

        let event = Arc::new(event);
        let outcomes = join_all(
            targets
                .iter()
                .map(|(_, channel)| channel.deliver(Arc::clone(&event))),
        )
        .await;

        let mut report = PublishReport::default();
        for ((id, _), outcome) in targets.into_iter().zip(outcomes) {
            match outcome {
                Outcome::Delivered => report.delivered += 1,
                Outcome::Dropped(reason) => {
                    warn!(
                        subscriber = %id,
                        reason,
                        seq = event.seq(),
                        category = %event.category(),
                        "event dropped for subscriber"
                    );
                    report.dropped.push(id);
                }
                Outcome::Closed => {}
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn streamer(capacity: usize, backpressure: BackpressurePolicy) -> DefaultStreamer {
        DefaultStreamer::new(&Config {
            queue_capacity: capacity,
            backpressure,
            ..Config::default()
        })
    }

    fn info(annotation: &str) -> Event {
        Event::info("sys", annotation).unwrap()
    }

    #[tokio::test]
    async fn test_subscribe_returns_live_channel() {
        let s = DefaultStreamer::default();
        let mut rx = s.subscribe("a").await.unwrap();
        assert_eq!(rx.id(), "a");

        let report = s.publish(info("hello")).await;
        assert_eq!(report.delivered, 1);
        assert!(report.is_complete());
        assert_eq!(rx.recv().await.unwrap().annotation(), "hello");
    }

    #[tokio::test]
    async fn test_duplicate_subscribe_keeps_first_registration() {
        let s = DefaultStreamer::default();
        let mut first = s.subscribe("a").await.unwrap();

        let err = s.subscribe("a").await.unwrap_err();
        assert_eq!(err, BusError::AlreadySubscribed { id: "a".into() });
        assert_eq!(s.subscriber_count().await, 1);

        s.publish(info("still here")).await;
        assert_eq!(first.recv().await.unwrap().annotation(), "still here");
    }

    #[tokio::test]
    async fn test_empty_id_is_rejected() {
        let s = DefaultStreamer::default();
        assert_eq!(s.subscribe("").await.unwrap_err(), BusError::EmptySubscriberId);
        assert_eq!(s.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn test_unsubscribe_closes_channel() {
        let s = DefaultStreamer::default();
        let mut rx = s.subscribe("a").await.unwrap();

        assert!(s.unsubscribe("a").await);
        assert!(rx.recv().await.is_none());
        assert!(!s.is_subscribed("a").await);

        let report = s.publish(info("after")).await;
        assert_eq!(report, PublishReport::default());
    }

    #[tokio::test]
    async fn test_unsubscribe_unknown_is_noop() {
        let s = DefaultStreamer::default();
        let mut rx = s.subscribe("a").await.unwrap();

        assert!(!s.unsubscribe("ghost").await);
        assert!(!s.unsubscribe("ghost").await);
        assert!(s.is_subscribed("a").await);

        s.publish(info("x")).await;
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_resubscribe_after_unsubscribe() {
        let s = DefaultStreamer::default();
        let _old = s.subscribe("a").await.unwrap();
        s.unsubscribe("a").await;
        assert!(s.subscribe("a").await.is_ok());
    }

    #[tokio::test]
    async fn test_release_ignores_newer_registration() {
        let s = DefaultStreamer::default();
        let stale = s.subscribe("a").await.unwrap().registration();
        assert_eq!(s.close_all().await, 1);
        assert!(stale.is_closed());

        let mut current = s.subscribe("a").await.unwrap();
        assert!(!s.release(&stale).await);
        assert!(s.is_subscribed("a").await);

        s.publish(info("kept")).await;
        assert_eq!(current.recv().await.unwrap().annotation(), "kept");

        assert!(s.release(&current.registration()).await);
        assert!(!s.is_subscribed("a").await);
        assert!(current.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_release_through_arc_and_default_method() {
        struct Plain(DefaultStreamer);

        #[async_trait]
        impl Streamer for Plain {
            async fn subscribe(&self, id: &str) -> Result<Delivery, BusError> {
                self.0.subscribe(id).await
            }
            async fn unsubscribe(&self, id: &str) -> bool {
                self.0.unsubscribe(id).await
            }
            async fn publish(&self, event: Event) -> PublishReport {
                self.0.publish(event).await
            }
        }

        let s = Arc::new(Plain(DefaultStreamer::default()));
        let reg = s.subscribe("a").await.unwrap().registration();
        assert!(s.release(&reg).await);
        assert!(!s.release(&reg).await);
        assert!(!s.0.is_subscribed("a").await);
    }

    #[tokio::test]
    async fn test_huge_capacity_is_clamped_for_every_policy() {
        let policies = [
            BackpressurePolicy::Block,
            BackpressurePolicy::DropNewest,
            BackpressurePolicy::DropOldest,
            BackpressurePolicy::Timeout(Duration::from_millis(10)),
        ];
        for policy in policies {
            let s = streamer(usize::MAX, policy);
            let mut rx = s.subscribe("big").await.unwrap();
            assert_eq!(s.publish(info("fits")).await.delivered, 1);
            assert_eq!(rx.recv().await.unwrap().annotation(), "fits");
        }
    }

    #[tokio::test]
    async fn test_each_subscriber_gets_exactly_one_copy() {
        let s = DefaultStreamer::default();
        let mut receivers = Vec::new();
        for i in 0..16 {
            receivers.push(s.subscribe(&format!("sub-{i}")).await.unwrap());
        }

        let event = info("fan-out");
        let report = s.publish(event.clone()).await;
        assert_eq!(report.delivered, 16);

        for rx in &mut receivers {
            let got = rx.recv().await.unwrap();
            assert_eq!(*got, event);
        }
        s.close_all().await;
        for rx in &mut receivers {
            assert!(rx.recv().await.is_none());
        }
    }

    #[tokio::test]
    async fn test_full_queue_is_reported_not_blocking() {
        let s = streamer(1, BackpressurePolicy::DropNewest);
        let _slow = s.subscribe("slow").await.unwrap();
        let mut fast = s.subscribe("fast").await.unwrap();

        s.publish(info("1")).await;
        assert!(fast.recv().await.is_some());

        let report = tokio::time::timeout(Duration::from_secs(1), s.publish(info("2")))
            .await
            .expect("publish must not block");
        assert_eq!(report.delivered, 1);
        assert_eq!(report.dropped, vec![Arc::<str>::from("slow")]);
    }

    #[tokio::test]
    async fn test_blocked_publish_does_not_hold_registry() {
        let s = Arc::new(streamer(1, BackpressurePolicy::Block));
        let _stalled = s.subscribe("stalled").await.unwrap();
        s.publish(info("fills queue")).await;

        let blocked = {
            let s = Arc::clone(&s);
            tokio::spawn(async move { s.publish(info("waits")).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!blocked.is_finished());

        let other = tokio::time::timeout(Duration::from_secs(1), s.subscribe("other"))
            .await
            .expect("subscribe must not wait for a blocked publish");
        assert!(other.is_ok());

        assert!(s.unsubscribe("stalled").await);
        let report = tokio::time::timeout(Duration::from_secs(1), blocked)
            .await
            .expect("blocked publish should end on unsubscribe")
            .unwrap();
        assert_eq!(report.delivered, 0);
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_subscribers_sorted() {
        let s = DefaultStreamer::default();
        for id in ["b", "c", "a"] {
            let _ = s.subscribe(id).await.unwrap();
        }
        assert_eq!(s.subscribers().await, vec!["a", "b", "c"]);
    }
}

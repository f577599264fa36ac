//! # Subscription lifecycle manager.
//!
//! [`SubscriptionManager`] binds one [`Subscriber`] to one [`Streamer`]: it opens the
//! delivery channel, runs the receive loop that feeds `process()`, and calls the
//! `connected()`/`disconnected()` callbacks around it.
//!
//! ## Lifecycle
//! ```text
//! subscribe()                          (manager lock held throughout)
//!   ├─► live registration held ──► Err(AlreadySubscribed)
//!   ├─► stale registration held ──► retire it (see unsubscribe)
//!   ├─► streamer.subscribe(id) ──► Err(AlreadySubscribed | EmptySubscriberId) ─► return
//!   ├─► spawn receive loop:
//!   │      while let Some(ev) = delivery.recv()
//!   │        ├─ Sequential         ─► process(ev)                 (FIFO)
//!   │        └─ Concurrent { n }   ─► spawn process(ev)           (≤ n in flight)
//!   │                                  └─ panic caught → error!
//!   └─► subscriber.connected()
//!
//! unsubscribe()                        (manager lock held throughout)
//!   ├─► nothing held ─► return
//!   ├─► streamer.release(registration) ──► channel closed, loop sees end-of-stream
//!   ├─► join receive loop (≤ drain_timeout, then abort)
//!   └─► subscriber.disconnected()
//! ```
//!
//! ## Rules
//! - A manager holds at most one live registration, identified by its [`Registration`].
//! - `unsubscribe` releases only that registration: if the streamer already closed it
//!   and the id now belongs to another manager, the other manager is left alone.
//! - `unsubscribe` of a manager that never subscribed is a no-op; after a successful
//!   `subscribe`, `disconnected()` runs exactly once, even if the streamer dropped the
//!   registration first.
//! - `subscribe`, `connected()`, `unsubscribe` and `disconnected()` are serialized per
//!   manager, so `disconnected()` never runs before `connected()` returns.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use super::Subscriber;
use crate::config::{Config, saturating_millis};
use crate::error::BusError;
use crate::events::Event;
use crate::policies::Dispatch;
use crate::streamer::{Delivery, Registration, Streamer};

/// Binds a subscriber's receive loop and lifecycle callbacks to a streamer.
pub struct SubscriptionManager {
    streamer: Arc<dyn Streamer>,
    subscriber: Arc<dyn Subscriber>,
    dispatch: Dispatch,
    drain_limit: Option<Duration>,
    active: Mutex<Option<Active>>,
}

/// A started receive loop and the registration feeding it.
struct Active {
    worker: JoinHandle<()>,
    registration: Registration,
}

impl SubscriptionManager {
    /// Creates a manager with the default [`Config`].
    pub fn new(streamer: Arc<dyn Streamer>, subscriber: Arc<dyn Subscriber>) -> Self {
        Self::with_config(streamer, subscriber, &Config::default())
    }

    /// Creates a manager using the dispatch mode and drain timeout of `cfg`.
    pub fn with_config(
        streamer: Arc<dyn Streamer>,
        subscriber: Arc<dyn Subscriber>,
        cfg: &Config,
    ) -> Self {
        Self {
            streamer,
            subscriber,
            dispatch: cfg.dispatch,
            drain_limit: cfg.drain_limit(),
            active: Mutex::new(None),
        }
    }

    /// Starts a builder; missing parts surface as errors from [`SubscriptionManagerBuilder::build`].
    pub fn builder() -> SubscriptionManagerBuilder {
        SubscriptionManagerBuilder::default()
    }

    /// The managed subscriber's id.
    #[inline]
    pub fn id(&self) -> &str {
        self.subscriber.id()
    }

    /// Returns `true` while this manager's registration is live on the streamer.
    pub async fn is_active(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .is_some_and(|active| !active.registration.is_closed())
    }

    /// Registers the subscriber, starts its receive loop and calls `connected()`.
    ///
    /// A registration the streamer closed on its own is retired first (its
    /// `disconnected()` runs) before the new one is opened.
    ///
    /// # Errors
    /// - [`BusError::AlreadySubscribed`] if this manager is already active;
    /// - whatever [`Streamer::subscribe`] returns.
    ///
    /// On error the receive loop is not started and `connected()` is not called.
    pub async fn subscribe(&self) -> Result<(), BusError> {
        let mut slot = self.active.lock().await;
        if let Some(active) = slot.take() {
            if !active.registration.is_closed() {
                *slot = Some(active);
                return Err(BusError::AlreadySubscribed {
                    id: self.id().to_owned(),
                });
            }
            self.retire(active).await;
        }

        let delivery = self.streamer.subscribe(self.subscriber.id()).await?;
        let registration = delivery.registration();
        let worker = tokio::spawn(receive_loop(
            delivery,
            Arc::clone(&self.subscriber),
            self.dispatch,
        ));
        *slot = Some(Active {
            worker,
            registration,
        });

        self.subscriber.connected().await;
        info!(subscriber = self.id(), "subscribed to the streamer");
        Ok(())
    }

    /// Releases the registration, waits for the receive loop and calls `disconnected()`.
    pub async fn unsubscribe(&self) {
        let mut slot = self.active.lock().await;
        if let Some(active) = slot.take() {
            self.retire(active).await;
        }
    }

    async fn retire(&self, active: Active) {
        let Active {
            mut worker,
            registration,
        } = active;
        if !self.streamer.release(&registration).await {
            debug!(subscriber = self.id(), "registration was already closed by the streamer");
        }

        match self.drain_limit {
            Some(limit) => {
                if tokio::time::timeout(limit, &mut worker).await.is_err() {
                    warn!(
                        subscriber = self.id(),
                        limit_ms = saturating_millis(limit),
                        "receive loop did not drain in time; aborting"
                    );
                    worker.abort();
                }
            }
            None => {
                let _ = worker.await;
            }
        }

        self.subscriber.disconnected().await;
        info!(subscriber = self.id(), "unsubscribed from the streamer");
    }
}

impl std::fmt::Debug for SubscriptionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionManager")
            .field("id", &self.id())
            .field("dispatch", &self.dispatch)
            .finish_non_exhaustive()
    }
}

/// Builder for [`SubscriptionManager`].
#[derive(Default)]
pub struct SubscriptionManagerBuilder {
    streamer: Option<Arc<dyn Streamer>>,
    subscriber: Option<Arc<dyn Subscriber>>,
    cfg: Config,
}

impl SubscriptionManagerBuilder {
    pub fn with_streamer(mut self, streamer: Arc<dyn Streamer>) -> Self {
        self.streamer = Some(streamer);
        self
    }

    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscriber>) -> Self {
        self.subscriber = Some(subscriber);
        self
    }

    /// Sets dispatch mode and drain timeout (other fields are ignored here).
    pub fn with_config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Builds the manager.
    ///
    /// # Errors
    /// [`BusError::MissingRegistry`] without a streamer, then
    /// [`BusError::MissingSubscriber`] without a subscriber.
    pub fn build(self) -> Result<SubscriptionManager, BusError> {
        let streamer = self.streamer.ok_or(BusError::MissingRegistry)?;
        let subscriber = self.subscriber.ok_or(BusError::MissingSubscriber)?;
        Ok(SubscriptionManager::with_config(streamer, subscriber, &self.cfg))
    }
}

/// Subscribes `subscriber` to `streamer`, treating any failure as fatal.
///
/// Intended for application startup, where a duplicate id is a wiring bug.
/// Keep the returned manager to unsubscribe later.
///
/// # Panics
/// If the subscription fails (e.g. [`BusError::AlreadySubscribed`]).
pub async fn connect(
    streamer: Arc<dyn Streamer>,
    subscriber: Arc<dyn Subscriber>,
) -> SubscriptionManager {
    let manager = SubscriptionManager::new(streamer, subscriber);
    if let Err(err) = manager.subscribe().await {
        panic!("failed to subscribe {}: {err}", manager.id());
    }
    manager
}

async fn receive_loop(mut delivery: Delivery, subscriber: Arc<dyn Subscriber>, dispatch: Dispatch) {
    match dispatch {
        Dispatch::Sequential => {
            while let Some(ev) = delivery.recv().await {
                process_isolated(subscriber.as_ref(), &ev).await;
            }
        }
        Dispatch::Concurrent { .. } => {
            let permits = Arc::new(Semaphore::new(dispatch.parallelism()));
            let mut in_flight = JoinSet::new();

            while let Some(ev) = delivery.recv().await {
                let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                    break;
                };
                let sub = Arc::clone(&subscriber);
                in_flight.spawn(async move {
                    process_isolated(sub.as_ref(), &ev).await;
                    drop(permit);
                });
                while in_flight.try_join_next().is_some() {}
            }
            while in_flight.join_next().await.is_some() {}
        }
    }

    if delivery.skipped() > 0 {
        warn!(
            subscriber = delivery.id(),
            skipped = delivery.skipped(),
            "events overwritten before processing"
        );
    }
}

/// Runs `process` and converts a panic into an error log.
async fn process_isolated(subscriber: &dyn Subscriber, event: &Event) {
    let fut = subscriber.process(event);
    if let Err(panic_err) = AssertUnwindSafe(fut).catch_unwind().await {
        error!(
            subscriber = subscriber.id(),
            seq = event.seq(),
            panic = %panic_message(&*panic_err),
            "subscriber panicked while processing event"
        );
    }
}

fn panic_message(any: &(dyn Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

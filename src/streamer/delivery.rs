//! # Per-subscriber delivery channels.
//!
//! A delivery channel is a bounded queue owned by the streamer. The streamer keeps
//! the sending half ([`Channel`]) in its registry; the subscriber side reads the
//! receiving half ([`Delivery`]).
//!
//! ## Architecture
//! ```text
//! BackpressurePolicy       sending half                  receiving half
//!   Block        ──►  mpsc::Sender::send           ──┐
//!   DropNewest   ──►  mpsc::Sender::try_send       ──┼──►  mpsc::Receiver ──► Delivery::recv()
//!   Timeout(d)   ──►  mpsc::Sender::send_timeout   ──┘
//!   DropOldest   ──►  Ring::push (evicts the front) ────►  Ring::pop      ──► Delivery::recv()
//!                                                          (evicted n → skip n)
//! ```
//!
//! ## Rules
//! - **Exact capacity**: every policy holds at most `capacity` undelivered events.
//! - **Close is immediate**: closing cancels the channel's token; `recv()` returns `None`
//!   right away, discarding anything still buffered, and pending `Block`/`Timeout` sends
//!   give up.
//! - **Ring mode**: with `DropOldest` a full queue evicts its oldest entry; the reader
//!   counts what it missed in [`Delivery::skipped`].
//! - **Identity**: each channel gets a process-unique epoch, carried by its
//!   [`Registration`], so a stale handle never matches a newer channel for the same id.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{Notify, mpsc};
use tokio_util::sync::CancellationToken;

use crate::events::Event;
use crate::policies::BackpressurePolicy;

static CHANNEL_EPOCH: AtomicU64 = AtomicU64::new(1);

/// Result of handing one event to one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The queue accepted the event.
    Delivered,
    /// The event was dropped for this subscriber (queue full or wait timed out).
    Dropped(&'static str),
    /// The channel was closed before the event was accepted.
    Closed,
}

enum Inlet {
    Blocking(mpsc::Sender<Arc<Event>>),
    Lossy(mpsc::Sender<Arc<Event>>),
    Timed(mpsc::Sender<Arc<Event>>, Duration),
    Ring(Arc<Ring>),
}

enum Outlet {
    Queue(mpsc::Receiver<Arc<Event>>),
    Ring(Arc<Ring>),
}

enum Next {
    Event(Arc<Event>),
    Skipped(u64),
    Closed,
}

/// Fixed-size queue that evicts its oldest entry when full.
struct Ring {
    capacity: usize,
    slots: Mutex<RingSlots>,
    ready: Notify,
}

#[derive(Default)]
struct RingSlots {
    queue: VecDeque<Arc<Event>>,
    evicted: u64,
}

impl Ring {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: Mutex::new(RingSlots::default()),
            ready: Notify::new(),
        }
    }

    fn push(&self, event: Arc<Event>) {
        {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            if slots.queue.len() >= self.capacity {
                slots.queue.pop_front();
                slots.evicted = slots.evicted.saturating_add(1);
            }
            slots.queue.push_back(event);
        }
        self.ready.notify_one();
    }

    async fn pop(&self) -> Next {
        loop {
            let ready = self.ready.notified();
            {
                let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
                if slots.evicted > 0 {
                    return Next::Skipped(std::mem::take(&mut slots.evicted));
                }
                if let Some(ev) = slots.queue.pop_front() {
                    return Next::Event(ev);
                }
            }
            ready.await;
        }
    }
}

/// Sending half of a delivery channel, kept by the streamer.
pub(crate) struct Channel {
    inlet: Inlet,
    epoch: u64,
    closed: CancellationToken,
}

impl Channel {
    /// Hands `event` to the queue according to the channel's backpressure policy.
    pub(crate) async fn deliver(&self, event: Arc<Event>) -> Outcome {
        if self.closed.is_cancelled() {
            return Outcome::Closed;
        }
        match &self.inlet {
            Inlet::Lossy(tx) => match tx.try_send(event) {
                Ok(()) => Outcome::Delivered,
                Err(mpsc::error::TrySendError::Full(_)) => Outcome::Dropped("full"),
                Err(mpsc::error::TrySendError::Closed(_)) => Outcome::Closed,
            },
            Inlet::Ring(ring) => {
                ring.push(event);
                Outcome::Delivered
            }
            Inlet::Blocking(tx) => {
                tokio::select! {
                    biased;
                    _ = self.closed.cancelled() => Outcome::Closed,
                    res = tx.send(event) => match res {
                        Ok(()) => Outcome::Delivered,
                        Err(_) => Outcome::Closed,
                    },
                }
            }
            Inlet::Timed(tx, wait) => {
                tokio::select! {
                    biased;
                    _ = self.closed.cancelled() => Outcome::Closed,
                    res = tx.send_timeout(event, *wait) => match res {
                        Ok(()) => Outcome::Delivered,
                        Err(mpsc::error::SendTimeoutError::Timeout(_)) => Outcome::Dropped("timeout"),
                        Err(mpsc::error::SendTimeoutError::Closed(_)) => Outcome::Closed,
                    },
                }
            }
        }
    }

    /// Matches a [`Registration`] issued for this very channel.
    #[inline]
    pub(crate) fn is_issued(&self, registration: &Registration) -> bool {
        self.epoch == registration.epoch
    }

    /// Signals end-of-stream to the reader.
    pub(crate) fn close(&self) {
        self.closed.cancel();
    }
}

/// Handle identifying one registration of a subscriber id.
///
/// Obtained from [`Delivery::registration`] and handed back to
/// [`Streamer::release`](crate::Streamer::release), which removes the registration only
/// if the id has not been re-subscribed in the meantime.
#[derive(Clone)]
pub struct Registration {
    id: Arc<str>,
    epoch: u64,
    closed: CancellationToken,
}

impl Registration {
    /// The subscriber id.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns `true` once the channel behind this registration has been closed.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("epoch", &self.epoch)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Receiving half of a subscriber's delivery channel.
///
/// Returned by [`Streamer::subscribe`](crate::Streamer::subscribe). Reading is the only
/// thing a holder can do; the streamer owns the channel and closes it on unsubscribe.
pub struct Delivery {
    id: Arc<str>,
    epoch: u64,
    outlet: Outlet,
    closed: CancellationToken,
    skipped: u64,
}

impl Delivery {
    /// Waits for the next event.
    ///
    /// Returns `None` once the channel is closed (the subscriber was unsubscribed).
    /// Events evicted under [`BackpressurePolicy::DropOldest`] are skipped.
    pub async fn recv(&mut self) -> Option<Arc<Event>> {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.closed.cancelled() => Next::Closed,
                next = Self::next(&mut self.outlet) => next,
            };
            match next {
                Next::Event(ev) => return Some(ev),
                Next::Skipped(n) => {
                    self.skipped = self.skipped.saturating_add(n);
                    continue;
                }
                Next::Closed => return None,
            }
        }
    }

    async fn next(outlet: &mut Outlet) -> Next {
        match outlet {
            Outlet::Queue(rx) => match rx.recv().await {
                Some(ev) => Next::Event(ev),
                None => Next::Closed,
            },
            Outlet::Ring(ring) => ring.pop().await,
        }
    }

    /// The subscriber id this channel was opened for.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Identity of the registration this channel belongs to.
    pub fn registration(&self) -> Registration {
        Registration {
            id: Arc::clone(&self.id),
            epoch: self.epoch,
            closed: self.closed.clone(),
        }
    }

    /// Returns `true` once the streamer has closed the channel.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Number of events evicted before they could be read.
    #[inline]
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delivery")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .field("skipped", &self.skipped)
            .finish()
    }
}

/// Opens a delivery channel for `id`.
///
/// `capacity` must already be clamped to `1..=Config::MAX_QUEUE_CAPACITY`.
pub(crate) fn channel(
    id: Arc<str>,
    capacity: usize,
    policy: BackpressurePolicy,
) -> (Channel, Delivery) {
    let closed = CancellationToken::new();
    let epoch = CHANNEL_EPOCH.fetch_add(1, Ordering::Relaxed);
    let (inlet, outlet) = match policy {
        BackpressurePolicy::DropOldest => {
            let ring = Arc::new(Ring::new(capacity));
            (Inlet::Ring(Arc::clone(&ring)), Outlet::Ring(ring))
        }
        BackpressurePolicy::Block => {
            let (tx, rx) = mpsc::channel(capacity);
            (Inlet::Blocking(tx), Outlet::Queue(rx))
        }
        BackpressurePolicy::DropNewest => {
            let (tx, rx) = mpsc::channel(capacity);
            (Inlet::Lossy(tx), Outlet::Queue(rx))
        }
        BackpressurePolicy::Timeout(wait) => {
            let (tx, rx) = mpsc::channel(capacity);
            (Inlet::Timed(tx, wait), Outlet::Queue(rx))
        }
    };
    (
        Channel {
            inlet,
            epoch,
            closed: closed.clone(),
        },
        Delivery {
            id,
            epoch,
            outlet,
            closed,
            skipped: 0,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(n: i64) -> Arc<Event> {
        Arc::new(Event::info("test", n.to_string()).unwrap().with_payload(n))
    }

    fn open(capacity: usize, policy: BackpressurePolicy) -> (Channel, Delivery) {
        channel(Arc::from("sub"), capacity, policy)
    }

    #[tokio::test]
    async fn test_drop_newest_reports_full() {
        let (ch, mut rx) = open(1, BackpressurePolicy::DropNewest);
        assert_eq!(ch.deliver(ev(1)).await, Outcome::Delivered);
        assert_eq!(ch.deliver(ev(2)).await, Outcome::Dropped("full"));

        let got = rx.recv().await.unwrap();
        assert_eq!(got.payload().and_then(|p| p.as_int()), Some(1));
    }

    #[tokio::test]
    async fn test_drop_oldest_keeps_newest() {
        let (ch, mut rx) = open(2, BackpressurePolicy::DropOldest);
        for n in 1..=5 {
            assert_eq!(ch.deliver(ev(n)).await, Outcome::Delivered);
        }

        let a = rx.recv().await.unwrap();
        let b = rx.recv().await.unwrap();
        assert_eq!(a.payload().and_then(|p| p.as_int()), Some(4));
        assert_eq!(b.payload().and_then(|p| p.as_int()), Some(5));
        assert_eq!(rx.skipped(), 3);
    }

    #[tokio::test]
    async fn test_drop_oldest_holds_exact_capacity() {
        let (ch, mut rx) = open(3, BackpressurePolicy::DropOldest);
        for n in 1..=10 {
            assert_eq!(ch.deliver(ev(n)).await, Outcome::Delivered);
        }

        let mut kept = Vec::new();
        for _ in 0..3 {
            let got = rx.recv().await.unwrap();
            kept.push(got.payload().and_then(|p| p.as_int()).unwrap());
        }
        assert_eq!(kept, vec![8, 9, 10]);
        assert!(
            tokio::time::timeout(Duration::from_millis(20), rx.recv())
                .await
                .is_err()
        );
        assert_eq!(rx.skipped(), 7);
    }

    #[tokio::test]
    async fn test_ring_reader_wakes_on_push() {
        let (ch, mut rx) = open(3, BackpressurePolicy::DropOldest);
        let reader = tokio::spawn(async move { rx.recv().await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(ch.deliver(ev(7)).await, Outcome::Delivered);
        let got = tokio::time::timeout(Duration::from_secs(1), reader)
            .await
            .expect("reader should wake")
            .unwrap()
            .unwrap();
        assert_eq!(got.payload().and_then(|p| p.as_int()), Some(7));
    }

    #[tokio::test]
    async fn test_registrations_of_distinct_channels_differ() {
        let (first, rx1) = open(1, BackpressurePolicy::DropNewest);
        let (second, rx2) = open(1, BackpressurePolicy::DropNewest);

        assert!(first.is_issued(&rx1.registration()));
        assert!(!first.is_issued(&rx2.registration()));
        assert!(second.is_issued(&rx2.registration()));

        first.close();
        assert!(rx1.registration().is_closed());
        assert!(!rx2.registration().is_closed());
    }

    #[tokio::test]
    async fn test_timeout_gives_up() {
        let wait = Duration::from_millis(20);
        let (ch, _rx) = open(1, BackpressurePolicy::Timeout(wait));
        assert_eq!(ch.deliver(ev(1)).await, Outcome::Delivered);
        assert_eq!(ch.deliver(ev(2)).await, Outcome::Dropped("timeout"));
    }

    #[tokio::test]
    async fn test_block_waits_for_room() {
        let (ch, mut rx) = open(1, BackpressurePolicy::Block);
        let ch = Arc::new(ch);
        assert_eq!(ch.deliver(ev(1)).await, Outcome::Delivered);

        let pending = {
            let ch = Arc::clone(&ch);
            tokio::spawn(async move { ch.deliver(ev(2)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pending.is_finished());

        assert!(rx.recv().await.is_some());
        assert_eq!(pending.await.unwrap(), Outcome::Delivered);
    }

    #[tokio::test]
    async fn test_close_wakes_blocked_sender() {
        let (ch, _rx) = open(1, BackpressurePolicy::Block);
        let ch = Arc::new(ch);
        assert_eq!(ch.deliver(ev(1)).await, Outcome::Delivered);

        let pending = {
            let ch = Arc::clone(&ch);
            tokio::spawn(async move { ch.deliver(ev(2)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        ch.close();

        let outcome = tokio::time::timeout(Duration::from_secs(1), pending)
            .await
            .expect("blocked sender should wake on close")
            .unwrap();
        assert_eq!(outcome, Outcome::Closed);
    }

    #[tokio::test]
    async fn test_close_ends_stream_and_discards_buffer() {
        let (ch, mut rx) = open(4, BackpressurePolicy::DropNewest);
        assert_eq!(ch.deliver(ev(1)).await, Outcome::Delivered);
        ch.close();

        assert!(rx.is_closed());
        assert!(rx.recv().await.is_none());
        assert_eq!(ch.deliver(ev(2)).await, Outcome::Closed);
    }
}

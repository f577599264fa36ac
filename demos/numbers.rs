//! # Example: numbers
//!
//! Wires three producers and a logger through one streamer:
//!
//! - two `NumberPublisher`s emit a random number every 2s;
//! - a `SquaredPublisher` reacts to every number by publishing its square;
//! - a `CountPublisher` counts numbers and reports the total every 5s;
//! - a [`LogWriter`] prints everything.
//!
//! ## Flow
//! ```text
//! NumberPublisher ── number ──► DefaultStreamer ──┬─► SquaredPublisher ── squared-number ──┐
//!                                     ▲           ├─► CountPublisher   ── number-count ────┤
//!                                     │           └─► LogWriter (stdout)                   │
//!                                     └────────────────────────────────────────────────────┘
//! Ctrl-C ──► shutdown event ──► grace ──► unsubscribe all
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example numbers
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use streambus::{
    Category, CategoryRegistry, Config, DefaultStreamer, Event, LogWriter, Streamer, Subscriber,
    connect, shutdown,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Emits a random number in `0..1000` on every tick.
struct NumberPublisher {
    id: Arc<str>,
    streamer: Arc<dyn Streamer>,
    number: Category,
    every: Duration,
    stop: CancellationToken,
}

impl NumberPublisher {
    fn new(id: &str, streamer: Arc<dyn Streamer>, number: Category, every: Duration) -> Self {
        Self {
            id: Arc::from(id),
            streamer,
            number,
            every,
            stop: CancellationToken::new(),
        }
    }
}

#[async_trait]
impl Subscriber for NumberPublisher {
    fn id(&self) -> &str {
        &self.id
    }

    async fn process(&self, _event: &Event) {}

    async fn connected(&self) {
        let id = Arc::clone(&self.id);
        let streamer = Arc::clone(&self.streamer);
        let number = self.number.clone();
        let stop = self.stop.clone();
        let mut tick = tokio::time::interval(self.every);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = tick.tick() => {
                        let n: i64 = rand::rng().random_range(0..1_000);
                        match Event::new(Arc::clone(&id), number.clone(), n.to_string()) {
                            Ok(ev) => {
                                streamer.publish(ev.with_payload(n)).await;
                            }
                            Err(err) => {
                                tracing::error!(publisher = %id, error = %err, "cannot build event");
                                break;
                            }
                        }
                    }
                }
            }
        });
    }

    async fn disconnected(&self) {
        self.stop.cancel();
    }
}

/// Publishes the square of every number it sees.
struct SquaredPublisher {
    id: Arc<str>,
    streamer: Arc<dyn Streamer>,
    number: Category,
    squared: Category,
}

#[async_trait]
impl Subscriber for SquaredPublisher {
    fn id(&self) -> &str {
        &self.id
    }

    async fn process(&self, event: &Event) {
        if event.category() != &self.number {
            return;
        }
        let Some(n) = event.payload().and_then(|p| p.as_int()) else {
            return;
        };
        let square = n.saturating_mul(n);
        if let Ok(ev) = Event::new(Arc::clone(&self.id), self.squared.clone(), square.to_string()) {
            self.streamer.publish(ev.with_payload(square)).await;
        }
    }
}

/// Counts numbers and periodically reports the running total.
struct CountPublisher {
    id: Arc<str>,
    streamer: Arc<dyn Streamer>,
    number: Category,
    count_update: Category,
    count: Arc<AtomicI64>,
    stop: CancellationToken,
}

#[async_trait]
impl Subscriber for CountPublisher {
    fn id(&self) -> &str {
        &self.id
    }

    async fn process(&self, event: &Event) {
        if event.category() == &self.number {
            self.count.fetch_add(1, Ordering::Relaxed);
        }
    }

    async fn connected(&self) {
        let id = Arc::clone(&self.id);
        let streamer = Arc::clone(&self.streamer);
        let count_update = self.count_update.clone();
        let count = Arc::clone(&self.count);
        let stop = self.stop.clone();
        let mut tick = tokio::time::interval(Duration::from_secs(5));

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = tick.tick() => {
                        let n = count.load(Ordering::Relaxed);
                        if let Ok(ev) = Event::new(Arc::clone(&id), count_update.clone(), n.to_string()) {
                            streamer.publish(ev.with_payload(n)).await;
                        }
                    }
                }
            }
        });
    }

    async fn disconnected(&self) {
        self.stop.cancel();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("streambus=info".parse()?),
        )
        .init();

    let cfg = Config {
        grace: Duration::from_secs(5),
        ..Config::default()
    };

    let categories = CategoryRegistry::new();
    let number = categories.register("number");
    let squared = categories.register("squared-number");
    let count_update = categories.register("number-count");

    let streamer = DefaultStreamer::shared(&cfg);
    let bus: Arc<dyn Streamer> = streamer.clone();

    let managers = vec![
        connect(bus.clone(), Arc::new(LogWriter::new())).await,
        connect(
            bus.clone(),
            Arc::new(NumberPublisher::new(
                "number-publisher-1",
                bus.clone(),
                number.clone(),
                Duration::from_secs(2),
            )),
        )
        .await,
        connect(
            bus.clone(),
            Arc::new(NumberPublisher::new(
                "number-publisher-2",
                bus.clone(),
                number.clone(),
                Duration::from_secs(2),
            )),
        )
        .await,
        connect(
            bus.clone(),
            Arc::new(SquaredPublisher {
                id: Arc::from("squared-number-publisher-1"),
                streamer: bus.clone(),
                number: number.clone(),
                squared,
            }),
        )
        .await,
        connect(
            bus.clone(),
            Arc::new(CountPublisher {
                id: Arc::from("number-count-publisher-1"),
                streamer: bus.clone(),
                number,
                count_update,
                count: Arc::new(AtomicI64::new(0)),
                stop: CancellationToken::new(),
            }),
        )
        .await,
    ];

    println!("publishing numbers; press Ctrl-C to stop\n");
    shutdown::wait_for_termination(streamer.as_ref(), CancellationToken::new(), cfg.grace).await?;

    for manager in &managers {
        manager.unsubscribe().await;
    }
    println!("\nfinished");
    Ok(())
}

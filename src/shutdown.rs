//! # Termination: shutdown event on OS signal or cancellation.
//!
//! Provides [`wait_for_shutdown_signal`], an async helper that completes when the
//! process receives a termination signal, and helpers that turn a termination
//! trigger into a `shutdown` event on a [`Streamer`].
//!
//! ## Flow
//! ```text
//! trigger (OS signal | CancellationToken | any future)
//!     └─► publish Event { origin, category: "shutdown" }
//!          └─► sleep(grace)      (subscribers drain and react)
//!               └─► return PublishReport
//! ```
//!
//! ## Triggers
//! | Platform | Watched by [`wait_for_shutdown_signal`] |
//! |----------|------------------------------------------|
//! | unix     | `SIGINT`, `SIGTERM`, `SIGQUIT`           |
//! | other    | Ctrl-C                                   |
//!
//! [`wait_for_termination`] also accepts a [`CancellationToken`] so tests and embedding
//! applications can end the wait without a signal.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::saturating_millis;
use crate::events::{Category, Event};
use crate::streamer::{PublishReport, Streamer};

/// Origin used for the shutdown event.
pub const SHUTDOWN_ORIGIN: &str = "main";

const SHUTDOWN_ANNOTATION: &str = "application is shutting down";

/// Resolves on the first termination request the OS sends this process.
///
/// On unix that is `SIGINT`, `SIGTERM` or `SIGQUIT`; elsewhere only Ctrl-C is watched.
/// Listeners are installed per call and dropped once it resolves.
///
/// # Errors
/// If a signal listener cannot be installed.
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;
        let mut quit = signal(SignalKind::quit())?;
        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
            _ = quit.recv() => {}
        }
        Ok(())
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}

/// Waits for `trigger`, publishes a `shutdown` event and pauses for `grace`.
pub async fn publish_on_termination<S, F>(streamer: &S, trigger: F, grace: Duration) -> PublishReport
where
    S: Streamer + ?Sized,
    F: Future<Output = ()>,
{
    trigger.await;

    let event = Event::assemble(
        Arc::from(SHUTDOWN_ORIGIN),
        Category::shutdown(),
        Arc::from(SHUTDOWN_ANNOTATION),
    );
    let report = streamer.publish(event).await;
    info!(
        delivered = report.delivered,
        dropped = report.dropped.len(),
        grace_ms = saturating_millis(grace),
        "shutdown event published"
    );

    tokio::time::sleep(grace).await;
    report
}

/// Waits for an OS termination signal or for `token` to be cancelled, then publishes
/// the shutdown event and pauses for `grace`.
///
/// # Errors
/// If OS signal listeners cannot be registered.
pub async fn wait_for_termination<S>(
    streamer: &S,
    token: CancellationToken,
    grace: Duration,
) -> std::io::Result<PublishReport>
where
    S: Streamer + ?Sized,
{
    tokio::select! {
        res = wait_for_shutdown_signal() => res?,
        _ = token.cancelled() => {},
    }
    Ok(publish_on_termination(streamer, std::future::ready(()), grace).await)
}

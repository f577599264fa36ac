//! # LogWriter: event line printer
//!
//! A subscriber that writes one line per received [`Event`], in the event's
//! [`Display`](std::fmt::Display) form. Writes go to stdout by default or to any
//! `Write + Send` sink (a file, a buffer in tests).
//!
//! ## Example output
//! ```text
//! [number-publisher-1] *number*, 417 | payload:full
//! [squared-number-publisher-1] *squared-number*, 173889 | payload:full
//! [main] *shutdown*, application is shutting down | payload:empty
//! ```

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::warn;

use crate::events::Event;
use crate::subscribers::Subscriber;

static LOGGER_SEQ: AtomicU64 = AtomicU64::new(1);

/// Event writer subscriber.
pub struct LogWriter {
    id: String,
    out: Mutex<Box<dyn Write + Send>>,
}

impl LogWriter {
    /// Construct a writer to stdout with a generated id (`logger-<n>`).
    #[must_use]
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }

    /// Construct a writer to `out` with a generated id.
    #[must_use]
    pub fn with_writer(out: impl Write + Send + 'static) -> Self {
        Self {
            id: format!("logger-{}", LOGGER_SEQ.fetch_add(1, Ordering::Relaxed)),
            out: Mutex::new(Box::new(out)),
        }
    }

    /// Replace the generated id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

impl Default for LogWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Subscriber for LogWriter {
    fn id(&self) -> &str {
        &self.id
    }

    async fn process(&self, event: &Event) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = writeln!(out, "{event}").and_then(|()| out.flush()) {
            warn!(subscriber = %self.id, error = %err, "failed to write event");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::Payload;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_writes_one_line_per_event() {
        let buf = SharedBuf::default();
        let writer = LogWriter::with_writer(buf.clone());

        writer
            .process(&Event::info("system", "App started").unwrap())
            .await;
        writer
            .process(
                &Event::new("db", "query", "select")
                    .unwrap()
                    .with_payload(Payload::from(3)),
            )
            .await;

        assert_eq!(
            buf.contents(),
            "[system] *info*, App started | payload:empty\n\
             [db] *query*, select | payload:full\n"
        );
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = LogWriter::with_writer(io::sink());
        let b = LogWriter::with_writer(io::sink());
        assert_ne!(a.id(), b.id());
        assert!(a.id().starts_with("logger-"));
        assert_eq!(LogWriter::with_writer(io::sink()).with_id("audit").id(), "audit");
    }
}

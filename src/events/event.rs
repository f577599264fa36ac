//! # Events published through the bus.
//!
//! An [`Event`] records something that happened: who produced it (`origin`),
//! its [`Category`], a free-form `annotation` and an optional typed [`Payload`].
//!
//! ## Invariants
//! - `origin` and `category` are never empty; [`Event::new`] rejects them otherwise.
//! - Events are immutable: fields are read through accessors, and the bus shares one
//!   `Arc<Event>` between all subscribers of a publish call.
//!
//! ## Ordering
//! Each event gets a process-wide sequence number (`seq`) that increases monotonically
//! at construction. Use it to restore creation order in logs; the bus itself gives no
//! ordering guarantee across publishers.
//!
//! ## Example
//! ```rust
//! use streambus::{Category, Event};
//!
//! let ev = Event::new("sys", Category::info(), "started")
//!     .unwrap()
//!     .with_payload(42);
//!
//! assert_eq!(ev.origin(), "sys");
//! assert_eq!(ev.annotation(), "started");
//! assert_eq!(ev.payload().and_then(|p| p.as_int()), Some(42));
//! assert_eq!(ev.to_string(), "[sys] *info*, started | payload:full");
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use super::category::Category;
use super::payload::Payload;
use crate::error::BusError;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Immutable bus event.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    seq: u64,
    at: SystemTime,
    origin: Arc<str>,
    category: Category,
    annotation: Arc<str>,
    payload: Option<Payload>,
}

impl Event {
    /// Creates an event without payload.
    ///
    /// # Errors
    /// [`BusError::EmptyOrigin`] or [`BusError::EmptyCategory`].
    pub fn new(
        origin: impl Into<Arc<str>>,
        category: impl Into<Category>,
        annotation: impl Into<Arc<str>>,
    ) -> Result<Self, BusError> {
        let origin = origin.into();
        let category = category.into();
        if origin.is_empty() {
            return Err(BusError::EmptyOrigin);
        }
        if category.is_empty() {
            return Err(BusError::EmptyCategory);
        }
        Ok(Self::assemble(origin, category, annotation.into()))
    }

    /// Builds an event from parts already known to be non-empty.
    pub(crate) fn assemble(origin: Arc<str>, category: Category, annotation: Arc<str>) -> Self {
        debug_assert!(!origin.is_empty() && !category.is_empty());
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            origin,
            category,
            annotation,
            payload: None,
        }
    }

    /// Creates an `info` event.
    pub fn info(
        origin: impl Into<Arc<str>>,
        annotation: impl Into<Arc<str>>,
    ) -> Result<Self, BusError> {
        Self::new(origin, Category::info(), annotation)
    }

    /// Creates an `error` event.
    pub fn error(
        origin: impl Into<Arc<str>>,
        annotation: impl Into<Arc<str>>,
    ) -> Result<Self, BusError> {
        Self::new(origin, Category::error(), annotation)
    }

    /// Creates a `shutdown` event.
    pub fn shutdown(
        origin: impl Into<Arc<str>>,
        annotation: impl Into<Arc<str>>,
    ) -> Result<Self, BusError> {
        Self::new(origin, Category::shutdown(), annotation)
    }

    /// Attaches a payload.
    #[inline]
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Globally unique, monotonically increasing sequence number.
    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Wall-clock creation time.
    #[inline]
    pub fn at(&self) -> SystemTime {
        self.at
    }

    #[inline]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    #[inline]
    pub fn category(&self) -> &Category {
        &self.category
    }

    #[inline]
    pub fn annotation(&self) -> &str {
        &self.annotation
    }

    #[inline]
    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    #[inline]
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// Returns `true` if the event belongs to category `tag`.
    #[inline]
    pub fn is(&self, tag: &str) -> bool {
        self.category == tag
    }

    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.is(super::category::SHUTDOWN)
    }
}

impl fmt::Display for Event {
    /// Renders `[origin] *category*, annotation | payload:{empty|full}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let payload = if self.has_payload() { "full" } else { "empty" };
        write!(
            f,
            "[{}] *{}*, {} | payload:{}",
            self.origin, self.category, self.annotation, payload
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_event_preserves_fields() {
        let pairs = [("sys", "info"), ("db", "error"), ("x", "custom-tag")];
        for (origin, tag) in pairs {
            let ev = Event::new(origin, tag, "note").unwrap().with_payload("body");
            assert_eq!(ev.origin(), origin);
            assert_eq!(ev.category(), &tag);
            assert_eq!(ev.annotation(), "note");
            assert_eq!(ev.payload(), Some(&Payload::from("body")));
        }
    }

    #[test]
    fn test_empty_annotation_and_missing_payload_are_allowed() {
        let ev = Event::new("sys", "info", "").unwrap();
        assert_eq!(ev.annotation(), "");
        assert!(!ev.has_payload());
    }

    #[test]
    fn test_empty_origin_fails() {
        assert_eq!(Event::new("", "info", "x").unwrap_err(), BusError::EmptyOrigin);
        assert_eq!(Event::info("", "x").unwrap_err(), BusError::EmptyOrigin);
    }

    #[test]
    fn test_empty_category_fails() {
        assert_eq!(Event::new("sys", "", "x").unwrap_err(), BusError::EmptyCategory);
    }

    #[test]
    fn test_builtin_constructors() {
        assert!(Event::info("a", "b").unwrap().is("info"));
        assert!(Event::error("a", "b").unwrap().is("error"));
        assert!(Event::shutdown("a", "b").unwrap().is_shutdown());
    }

    #[test]
    fn test_sequence_increases() {
        let first = Event::info("a", "1").unwrap();
        let second = Event::info("a", "2").unwrap();
        assert!(second.seq() > first.seq());
    }

    #[test]
    fn test_clone_is_equal() {
        let ev = Event::info("a", "b").unwrap().with_payload(Payload::shared(3u8));
        assert_eq!(ev.clone(), ev);
    }

    #[test]
    fn test_display_format() {
        let empty = Event::new("number-publisher-1", "number", "17").unwrap();
        assert_eq!(
            empty.to_string(),
            "[number-publisher-1] *number*, 17 | payload:empty"
        );
        let full = empty.with_payload(17);
        assert_eq!(
            full.to_string(),
            "[number-publisher-1] *number*, 17 | payload:full"
        );
    }
}

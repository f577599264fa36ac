//! # Event categories and their registry.
//!
//! A [`Category`] is a short label classifying events (`"info"`, `"order-placed"`, ...).
//! The [`CategoryRegistry`] keeps the set of known labels so that two independently
//! written producers cannot silently reuse the same tag for different meanings.
//!
//! ## Rules
//! - Every registry starts with the built-ins `error`, `info`, `shutdown`.
//! - A tag is registered **at most once**. [`CategoryRegistry::register`] treats a
//!   duplicate as a programming error and panics; [`CategoryRegistry::try_register`]
//!   returns [`BusError::DuplicateCategory`] instead.
//! - The registry is a plain value shared by cloning (state lives behind an `Arc`),
//!   so tests and subsystems can each own an isolated one.
//!
//! ## Example
//! ```rust
//! use streambus::CategoryRegistry;
//!
//! let categories = CategoryRegistry::new();
//! assert!(categories.is_registered("info"));
//! assert!(!categories.is_registered("order-placed"));
//!
//! let placed = categories.register("order-placed");
//! assert!(categories.is_registered("order-placed"));
//!
//! let ev = categories.event("shop", "order-placed", "#1042").unwrap();
//! assert_eq!(ev.category(), &placed);
//! ```

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::BusError;
use crate::events::event::Event;

/// Tag of the built-in error category.
pub const ERROR: &str = "error";
/// Tag of the built-in info category.
pub const INFO: &str = "info";
/// Tag of the built-in shutdown category.
pub const SHUTDOWN: &str = "shutdown";

/// Built-in tags present in every registry.
pub const BUILTIN: [&str; 3] = [ERROR, INFO, SHUTDOWN];

/// Event category label.
///
/// Cheap to clone. Conversions from strings do not validate; emptiness is checked
/// where it matters ([`Event::new`] and the registry).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Category(Arc<str>);

impl Category {
    #[inline]
    pub fn error() -> Self {
        Self::from(ERROR)
    }

    #[inline]
    pub fn info() -> Self {
        Self::from(INFO)
    }

    #[inline]
    pub fn shutdown() -> Self {
        Self::from(SHUTDOWN)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` for `error`, `info` and `shutdown`.
    pub fn is_builtin(&self) -> bool {
        BUILTIN.contains(&self.as_str())
    }
}

impl Borrow<str> for Category {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Category {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Category {
    fn from(tag: &str) -> Self {
        Self(Arc::from(tag))
    }
}

impl From<String> for Category {
    fn from(tag: String) -> Self {
        Self(Arc::from(tag))
    }
}

impl From<&Category> for Category {
    fn from(tag: &Category) -> Self {
        tag.clone()
    }
}

impl PartialEq<str> for Category {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Category {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// Thread-safe set of known categories.
#[derive(Clone, Debug)]
pub struct CategoryRegistry {
    tags: Arc<RwLock<HashSet<Category>>>,
}

impl CategoryRegistry {
    /// Creates a registry holding only the built-in categories.
    #[must_use]
    pub fn new() -> Self {
        let tags = BUILTIN.iter().copied().map(Category::from).collect();
        Self {
            tags: Arc::new(RwLock::new(tags)),
        }
    }

    /// Registers a new category.
    ///
    /// # Errors
    /// - [`BusError::EmptyCategory`] if `tag` is empty;
    /// - [`BusError::DuplicateCategory`] if `tag` is already registered (the set is unchanged).
    pub fn try_register(&self, tag: impl Into<Category>) -> Result<Category, BusError> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(BusError::EmptyCategory);
        }

        let mut tags = self.tags.write().unwrap_or_else(PoisonError::into_inner);
        if !tags.insert(tag.clone()) {
            return Err(BusError::DuplicateCategory {
                tag: tag.as_str().to_owned(),
            });
        }
        Ok(tag)
    }

    /// Registers a new category, failing fast on collisions.
    ///
    /// # Panics
    /// If `tag` is empty or already registered. Two producers claiming the same tag
    /// is a programming error that must surface at startup.
    pub fn register(&self, tag: impl Into<Category>) -> Category {
        match self.try_register(tag) {
            Ok(tag) => tag,
            Err(err) => panic!("{err}"),
        }
    }

    /// Registers several categories with the same fail-fast rule as [`register`](Self::register).
    pub fn register_all<I, T>(&self, tags: I) -> Vec<Category>
    where
        I: IntoIterator<Item = T>,
        T: Into<Category>,
    {
        tags.into_iter().map(|tag| self.register(tag)).collect()
    }

    /// Returns `true` if `tag` is registered.
    pub fn is_registered(&self, tag: &str) -> bool {
        self.tags
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(tag)
    }

    /// Returns the registered category for `tag`, if any.
    pub fn lookup(&self, tag: &str) -> Option<Category> {
        self.tags
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tag)
            .cloned()
    }

    /// Returns a sorted snapshot of all registered categories.
    #[must_use]
    pub fn tags(&self) -> Vec<Category> {
        let g = self.tags.read().unwrap_or_else(PoisonError::into_inner);
        let mut v: Vec<Category> = g.iter().cloned().collect();
        v.sort_unstable();
        v
    }

    /// Builds an event whose category must already be registered.
    ///
    /// # Errors
    /// - [`BusError::EmptyOrigin`] / [`BusError::EmptyCategory`] for malformed input;
    /// - [`BusError::UnknownCategory`] if `tag` was never registered.
    pub fn event(
        &self,
        origin: impl Into<Arc<str>>,
        tag: &str,
        annotation: impl Into<Arc<str>>,
    ) -> Result<Event, BusError> {
        if tag.is_empty() {
            return Err(BusError::EmptyCategory);
        }
        let category = self.lookup(tag).ok_or_else(|| BusError::UnknownCategory {
            tag: tag.to_owned(),
        })?;
        Event::new(origin, category, annotation)
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! Bus events: data model and category registry.
//!
//! ## Contents
//! - [`Event`] immutable record (origin, category, annotation, payload)
//! - [`Payload`] typed payload variants
//! - [`Category`], [`CategoryRegistry`] category labels and the set of known ones
//!
//! ## Quick reference
//! - **Producers** build events with [`Event::new`] (or [`CategoryRegistry::event`]
//!   to also check the tag is registered) and hand them to
//!   [`Streamer::publish`](crate::Streamer::publish).
//! - **Consumers** receive `&Event` in [`Subscriber::process`](crate::Subscriber::process).

pub mod category;
mod event;
mod payload;

pub use category::{Category, CategoryRegistry};
pub use event::Event;
pub use payload::Payload;

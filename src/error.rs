//! Error types used by the streambus runtime.
//!
//! A single enum, [`BusError`], covers every failure the bus can report:
//!
//! - **construction**: [`BusError::MissingRegistry`], [`BusError::MissingSubscriber`]
//!   (a [`SubscriptionManager`](crate::SubscriptionManager) was built without one of its parts);
//! - **subscription**: [`BusError::AlreadySubscribed`], [`BusError::EmptySubscriberId`];
//! - **categories**: [`BusError::DuplicateCategory`], [`BusError::UnknownCategory`];
//! - **malformed events**: [`BusError::EmptyOrigin`], [`BusError::EmptyCategory`].
//!
//! Errors are always returned to the immediate caller; the bus never logs and drops them.
//! [`BusError::as_label`] gives a stable snake_case label for logs/metrics.

use thiserror::Error;

/// # Errors produced by the bus.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The subscription manager was built without a streamer.
    #[error("streamer is required")]
    MissingRegistry,

    /// The subscription manager was built without a subscriber.
    #[error("subscriber is required")]
    MissingSubscriber,

    /// A live registration already exists for this subscriber id.
    ///
    /// The existing registration is left untouched.
    #[error("subscriber {id} already subscribed")]
    AlreadySubscribed {
        /// The duplicate subscriber id.
        id: String,
    },

    /// Subscriber ids must not be empty.
    #[error("subscriber id must not be empty")]
    EmptySubscriberId,

    /// The category tag is already present in the registry.
    #[error("duplicate event category registration: {tag}")]
    DuplicateCategory {
        /// The colliding tag.
        tag: String,
    },

    /// The category tag was never registered.
    #[error("event category {tag} is not registered")]
    UnknownCategory {
        /// The unknown tag.
        tag: String,
    },

    /// Events must name their producer.
    #[error("event must have a non-empty origin")]
    EmptyOrigin,

    /// Events must carry a category tag.
    #[error("event must have a non-empty category")]
    EmptyCategory,
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use streambus::BusError;
    ///
    /// let err = BusError::AlreadySubscribed { id: "audit".into() };
    /// assert_eq!(err.as_label(), "bus_already_subscribed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::MissingRegistry => "bus_missing_registry",
            BusError::MissingSubscriber => "bus_missing_subscriber",
            BusError::AlreadySubscribed { .. } => "bus_already_subscribed",
            BusError::EmptySubscriberId => "bus_empty_subscriber_id",
            BusError::DuplicateCategory { .. } => "bus_duplicate_category",
            BusError::UnknownCategory { .. } => "bus_unknown_category",
            BusError::EmptyOrigin => "event_empty_origin",
            BusError::EmptyCategory => "event_empty_category",
        }
    }

    /// Indicates whether the error comes from building a subscription manager.
    ///
    /// # Example
    /// ```
    /// use streambus::BusError;
    ///
    /// assert!(BusError::MissingRegistry.is_construction());
    /// assert!(!BusError::EmptyOrigin.is_construction());
    /// ```
    pub fn is_construction(&self) -> bool {
        matches!(self, BusError::MissingRegistry | BusError::MissingSubscriber)
    }

    /// Indicates whether the error rejects a malformed event.
    pub fn is_malformed_event(&self) -> bool {
        matches!(self, BusError::EmptyOrigin | BusError::EmptyCategory)
    }
}

//! # Subscription Filters
//!
//! A subscription is keyed by an originator filter and a type filter; `None`
//! on either side is the wildcard.

use kernel_types::{ComponentId, Event, EventType};

/// Routing key of a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionKey {
    /// Exact originator, or `None` for any originator.
    pub originator: Option<ComponentId>,
    /// Exact event type, or `None` for any type.
    pub event_type: Option<EventType>,
}

impl SubscriptionKey {
    pub fn new(originator: Option<ComponentId>, event_type: Option<EventType>) -> Self {
        Self {
            originator,
            event_type,
        }
    }

    /// Wildcard on both axes.
    #[must_use]
    pub fn all() -> Self {
        Self::new(None, None)
    }

    /// Every event of one type regardless of originator.
    pub fn of_type(event_type: impl Into<EventType>) -> Self {
        Self::new(None, Some(event_type.into()))
    }

    /// Every event raised by one component.
    #[must_use]
    pub fn from_originator(originator: ComponentId) -> Self {
        Self::new(Some(originator), None)
    }

    /// Whether an event falls under this key.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        let origin_ok = match &self.originator {
            None => true,
            Some(origin) => event.originator() == Some(origin),
        };
        let type_ok = match &self.event_type {
            None => true,
            Some(event_type) => event.event_type() == event_type,
        };
        origin_ok && type_ok
    }

    /// The keys consulted for an event, in delivery order.
    ///
    /// Events without an originator skip the two exact-originator keys, which
    /// would otherwise alias the wildcard ones.
    #[must_use]
    pub fn lookup_order(event: &Event) -> Vec<SubscriptionKey> {
        let event_type = event.event_type().clone();
        let mut keys = Vec::with_capacity(4);

        if let Some(origin) = event.originator() {
            keys.push(Self::new(Some(origin.clone()), Some(event_type.clone())));
            keys.push(Self::new(Some(origin.clone()), None));
        }
        keys.push(Self::new(None, Some(event_type)));
        keys.push(Self::all());
        keys
    }
}

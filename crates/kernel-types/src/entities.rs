//! # Kernel Entities
//!
//! The event model carried by the bus:
//!
//! - `ComponentId`: identity of the component raising an event
//! - `EventType`: string discriminator used for routing
//! - `Event`: immutable envelope (originator, type, description)

use crate::ports::{SystemTimeSource, TimeSource, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Identity of a platform component that raises events.
///
/// Cheap to clone; two ids are equal when their names are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(Arc<str>);

impl ComponentId {
    /// Create a component id from its name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The component name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Event kind discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventType(Arc<str>);

impl EventType {
    /// The platform finished starting.
    pub const PLATFORM_STARTED: &'static str = "platform.started";

    /// The platform is shutting down. The bus stops dispatching after
    /// delivering an event of this type.
    pub const PLATFORM_SHUTDOWN: &'static str = "platform.shutdown";

    /// A login attempt was rejected.
    pub const LOGIN_FAILED: &'static str = "security.login_failed";

    /// A client crossed the failure threshold and was banned.
    pub const CLIENT_BANNED: &'static str = "security.client_banned";

    /// Create an event type from its name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The type name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the platform shutdown sentinel.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        &*self.0 == Self::PLATFORM_SHUTDOWN
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EventType {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// An event published on the kernel bus.
///
/// Lifecycle: create → enqueue → dispatch → discard. Nothing is persisted.
/// `id` and `timestamp` are for log correlation only and play no part in
/// routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    id: Uuid,
    originator: Option<ComponentId>,
    event_type: EventType,
    description: String,
    timestamp: Timestamp,
}

impl Event {
    /// Create an event stamped with the system clock.
    pub fn new(
        originator: Option<ComponentId>,
        event_type: impl Into<EventType>,
        description: impl Into<String>,
    ) -> Self {
        Self::at(
            SystemTimeSource.now(),
            originator,
            event_type,
            description,
        )
    }

    /// Create an event stamped with an explicit timestamp.
    pub fn at(
        timestamp: Timestamp,
        originator: Option<ComponentId>,
        event_type: impl Into<EventType>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            originator,
            event_type: event_type.into(),
            description: description.into(),
            timestamp,
        }
    }

    /// The `platform.started` lifecycle event.
    pub fn platform_started(originator: ComponentId) -> Self {
        Self::new(
            Some(originator),
            EventType::PLATFORM_STARTED,
            "Platform started",
        )
    }

    /// The `platform.shutdown` sentinel.
    pub fn platform_shutdown(originator: ComponentId) -> Self {
        Self::new(
            Some(originator),
            EventType::PLATFORM_SHUTDOWN,
            "Platform shutting down",
        )
    }

    /// Correlation id.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Component that raised the event, if any.
    #[must_use]
    pub fn originator(&self) -> Option<&ComponentId> {
        self.originator.as_ref()
    }

    /// Event kind.
    #[must_use]
    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    /// Human-readable summary.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Creation time in epoch milliseconds.
    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.originator {
            Some(origin) => write!(f, "[{}] {} from {}", self.event_type, self.description, origin),
            None => write!(f, "[{}] {}", self.event_type, self.description),
        }
    }
}

//! Lifecycle monitor: logs platform startup and shutdown.

use kernel_bus::EventConsumer;
use kernel_types::{Event, EventType};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Counts of lifecycle events observed so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleSnapshot {
    pub started: u64,
    pub shutdown: u64,
}

/// Logs platform startup and shutdown.
///
/// Subscribed to both lifecycle event types by the container.
#[derive(Debug, Default)]
pub struct LifecycleMonitor {
    started: AtomicU64,
    shutdown: AtomicU64,
}

impl LifecycleMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> LifecycleSnapshot {
        LifecycleSnapshot {
            started: self.started.load(Ordering::Relaxed),
            shutdown: self.shutdown.load(Ordering::Relaxed),
        }
    }
}

impl EventConsumer for LifecycleMonitor {
    fn on_event(&self, event: &Event) -> anyhow::Result<()> {
        match event.event_type().as_str() {
            EventType::PLATFORM_STARTED => {
                self.started.fetch_add(1, Ordering::Relaxed);
                info!(event_id = %event.id(), "Platform started");
            }
            EventType::PLATFORM_SHUTDOWN => {
                self.shutdown.fetch_add(1, Ordering::Relaxed);
                info!(event_id = %event.id(), "Platform shutting down");
            }
            other => anyhow::bail!("unexpected event type {other}"),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "lifecycle-monitor"
    }
}

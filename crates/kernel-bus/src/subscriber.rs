//! # Event Subscriber
//!
//! Consumers and the routing table the dispatcher reads from.

use crate::filter::SubscriptionKey;
use kernel_types::Event;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A callback invoked by the dispatch thread for each matching event.
///
/// Consumers run synchronously on the dispatch thread, one at a time. An
/// `Err` (or a panic) is logged and does not affect other consumers.
pub trait EventConsumer: Send + Sync {
    /// Handle one event.
    fn on_event(&self, event: &Event) -> anyhow::Result<()>;

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> EventConsumer for F
where
    F: Fn(&Event) -> anyhow::Result<()> + Send + Sync,
{
    fn on_event(&self, event: &Event) -> anyhow::Result<()> {
        self(event)
    }

    fn name(&self) -> &str {
        "closure"
    }
}

/// Subscription table shared by `subscribe` callers and the dispatcher.
///
/// There is no removal: a registration lives as long as the table.
#[derive(Default)]
pub struct SubscriptionTable {
    entries: Mutex<HashMap<SubscriptionKey, Vec<Arc<dyn EventConsumer>>>>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a consumer under a key. Registration is additive; the same
    /// consumer may appear under several keys or several times under one.
    pub fn insert(&self, key: SubscriptionKey, consumer: Arc<dyn EventConsumer>) {
        self.entries.lock().entry(key).or_default().push(consumer);
    }

    /// Consumers for an event in delivery order.
    ///
    /// The lock is released before returning so consumers can subscribe
    /// further consumers while being invoked.
    pub fn matching(&self, event: &Event) -> Vec<Arc<dyn EventConsumer>> {
        let keys = SubscriptionKey::lookup_order(event);
        let entries = self.entries.lock();

        keys.iter()
            .filter_map(|key| entries.get(key))
            .flat_map(|consumers| consumers.iter().cloned())
            .collect()
    }

    /// Total registrations across all keys.
    pub fn len(&self) -> usize {
        self.entries.lock().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! # Event Publisher
//!
//! The bus handle: producers publish through it, services subscribe through
//! it, and the owner closes it at shutdown.

use crate::dispatcher::{BusStats, Dispatcher};
use crate::filter::SubscriptionKey;
use crate::subscriber::{EventConsumer, SubscriptionTable};
use crate::{DEFAULT_PUBLISH_RETRY_MS, DEFAULT_QUEUE_CAPACITY, DISPATCH_THREAD_NAME};
use crossbeam_channel::{Receiver, SendTimeoutError, Sender};
use kernel_types::{ComponentId, Event, EventSink, EventType};
use parking_lot::Mutex;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors from starting the bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// A zero-capacity queue would turn every publish into a rendezvous.
    #[error("Event queue capacity must be greater than zero")]
    ZeroCapacity,

    /// The dispatch thread could not be spawned.
    #[error("Failed to spawn dispatch thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Bus tuning.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Maximum queued events before producers block.
    pub capacity: usize,
    /// How long a blocked producer waits per enqueue attempt.
    pub publish_retry_interval: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_QUEUE_CAPACITY,
            publish_retry_interval: Duration::from_millis(DEFAULT_PUBLISH_RETRY_MS),
        }
    }
}

/// Kernel event bus.
///
/// One bounded queue, one dispatch thread, global FIFO delivery. Dropping
/// the bus closes it.
pub struct EventBus {
    sender: Sender<Event>,
    stop: Sender<()>,
    table: Arc<SubscriptionTable>,
    stats: Arc<BusStats>,
    handle: Mutex<Option<JoinHandle<()>>>,
    dispatch_thread: ThreadId,
    done: Receiver<()>,
    config: BusConfig,
}

impl EventBus {
    /// Create the queue and spawn the dispatch thread.
    ///
    /// # Errors
    ///
    /// - `BusError::ZeroCapacity` - `config.capacity` is zero
    /// - `BusError::Spawn` - the OS refused to create the thread
    pub fn start(config: BusConfig) -> Result<Self, BusError> {
        if config.capacity == 0 {
            return Err(BusError::ZeroCapacity);
        }

        let (sender, events) = crossbeam_channel::bounded(config.capacity);
        let (stop, stop_rx) = crossbeam_channel::bounded(1);
        let (done_tx, done) = crossbeam_channel::bounded(0);
        let table = Arc::new(SubscriptionTable::new());
        let stats = Arc::new(BusStats::default());
        stats.running.store(true, Ordering::SeqCst);

        let dispatcher = Dispatcher {
            events,
            stop: stop_rx,
            table: Arc::clone(&table),
            stats: Arc::clone(&stats),
            _done: done_tx,
        };

        let handle = thread::Builder::new()
            .name(DISPATCH_THREAD_NAME.to_string())
            .spawn(move || dispatcher.run())
            .inspect_err(|_| stats.running.store(false, Ordering::SeqCst))?;

        info!(capacity = config.capacity, "Event bus started");

        Ok(Self {
            sender,
            stop,
            table,
            stats,
            dispatch_thread: handle.thread().id(),
            handle: Mutex::new(Some(handle)),
            done,
            config,
        })
    }

    /// Start with default capacity and retry interval.
    ///
    /// # Errors
    ///
    /// See [`EventBus::start`].
    pub fn with_defaults() -> Result<Self, BusError> {
        Self::start(BusConfig::default())
    }

    /// Enqueue an event for dispatch.
    ///
    /// Blocks while the queue is full and retries until space frees up; the
    /// event is never dropped while the dispatcher runs. Once the dispatcher
    /// has exited the event is discarded with a warning.
    ///
    /// Calling this from a consumer while the queue is full deadlocks the
    /// dispatch thread, since it is the only thread that drains the queue.
    pub fn publish(&self, event: Event) {
        let mut pending = event;
        let mut saturated = false;

        loop {
            match self
                .sender
                .send_timeout(pending, self.config.publish_retry_interval)
            {
                Ok(()) => {
                    self.stats.published.fetch_add(1, Ordering::Relaxed);
                    if saturated {
                        debug!("Event queue accepted event after backpressure");
                    }
                    return;
                }
                Err(SendTimeoutError::Timeout(event)) => {
                    if !saturated {
                        warn!(
                            capacity = self.config.capacity,
                            event_type = %event.event_type(),
                            "Event queue full, producer waiting"
                        );
                        saturated = true;
                    }
                    pending = event;
                }
                Err(SendTimeoutError::Disconnected(event)) => {
                    self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        event_id = %event.id(),
                        event_type = %event.event_type(),
                        "Event dropped (dispatcher stopped)"
                    );
                    return;
                }
            }
        }
    }

    /// Register a consumer for events matching both filters.
    ///
    /// `None` is the wildcard on either axis. Registrations are additive and
    /// cannot be removed.
    pub fn subscribe(
        &self,
        consumer: Arc<dyn EventConsumer>,
        originator: Option<ComponentId>,
        event_type: Option<EventType>,
    ) {
        self.subscribe_key(consumer, SubscriptionKey::new(originator, event_type));
    }

    /// Register a consumer under a prepared key.
    pub fn subscribe_key(&self, consumer: Arc<dyn EventConsumer>, key: SubscriptionKey) {
        debug!(
            consumer = consumer.name(),
            originator = ?key.originator,
            event_type = ?key.event_type,
            "New subscription created"
        );
        self.table.insert(key, consumer);
    }

    /// Stop the dispatcher after it has delivered what is already queued and
    /// wait for the thread to exit.
    ///
    /// Every caller waits, including concurrent and repeated ones. A consumer
    /// calling this on the dispatch thread only signals the stop; the loop
    /// exits once that consumer returns.
    pub fn close(&self) {
        // Full means a stop is already pending; disconnected means the
        // dispatcher exited on its own.
        let _ = self.stop.try_send(());

        if thread::current().id() == self.dispatch_thread {
            warn!("Event bus closed from its own dispatch thread, not joining");
            return;
        }

        // Lock released before joining so another closer can fall through
        // to the done channel.
        let handle = self.handle.lock().take();
        match handle {
            Some(handle) => {
                if handle.join().is_err() {
                    error!("Event dispatch thread panicked");
                }
                info!(
                    published = self.events_published(),
                    dispatched = self.events_dispatched(),
                    "Event bus closed"
                );
            }
            None => {
                // Disconnected once the dispatcher has been dropped
                let _ = self.done.recv();
            }
        }
    }

    /// Whether the dispatch thread is still delivering events.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.stats.running.load(Ordering::SeqCst)
    }

    /// Events accepted into the queue.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.stats.published.load(Ordering::Relaxed)
    }

    /// Events fully handed to their consumers.
    #[must_use]
    pub fn events_dispatched(&self) -> u64 {
        self.stats.dispatched.load(Ordering::Relaxed)
    }

    /// Consumer invocations that returned an error or panicked.
    #[must_use]
    pub fn consumer_failures(&self) -> u64 {
        self.stats.consumer_failures.load(Ordering::Relaxed)
    }

    /// Events discarded because the dispatcher had stopped.
    #[must_use]
    pub fn events_dropped(&self) -> u64 {
        self.stats.dropped.load(Ordering::Relaxed)
    }

    /// Events currently waiting in the queue.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.sender.len()
    }

    /// Queue capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Total consumer registrations.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.table.len()
    }
}

impl EventSink for EventBus {
    fn publish(&self, event: Event) {
        EventBus::publish(self, event);
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        self.close();
    }
}

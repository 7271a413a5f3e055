//! Dispatch loop run on the dedicated bus thread.

use crate::subscriber::SubscriptionTable;
use crossbeam_channel::{select, Receiver, Sender};
use kernel_types::Event;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Counters shared between the bus handle and its dispatcher.
#[derive(Debug, Default)]
pub(crate) struct BusStats {
    pub published: AtomicU64,
    pub dispatched: AtomicU64,
    pub consumer_failures: AtomicU64,
    pub dropped: AtomicU64,
    pub running: AtomicBool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

pub(crate) struct Dispatcher {
    pub events: Receiver<Event>,
    pub stop: Receiver<()>,
    pub table: Arc<SubscriptionTable>,
    pub stats: Arc<BusStats>,
    /// Never sent on. Dropped with the dispatcher, which disconnects every
    /// `close()` caller waiting for the thread to finish.
    pub _done: Sender<()>,
}

impl Dispatcher {
    /// Run until stopped, the shutdown sentinel is delivered, or every
    /// producer handle is gone.
    pub fn run(self) {
        info!("Event dispatcher started");

        loop {
            select! {
                recv(self.events) -> msg => match msg {
                    Ok(event) => {
                        if self.dispatch(&event) == Flow::Stop {
                            break;
                        }
                    }
                    Err(_) => break,
                },
                recv(self.stop) -> _ => {
                    self.drain();
                    break;
                }
            }
        }

        self.stats.running.store(false, Ordering::SeqCst);
        info!(
            dispatched = self.stats.dispatched.load(Ordering::Relaxed),
            abandoned = self.events.len(),
            "Event dispatcher stopped"
        );
    }

    /// Deliver what is already queued, then return.
    fn drain(&self) {
        debug!(pending = self.events.len(), "Stop requested, draining queue");
        while let Ok(event) = self.events.try_recv() {
            if self.dispatch(&event) == Flow::Stop {
                break;
            }
        }
    }

    fn dispatch(&self, event: &Event) -> Flow {
        let consumers = self.table.matching(event);

        debug!(
            event_id = %event.id(),
            event_type = %event.event_type(),
            consumers = consumers.len(),
            "Dispatching event"
        );

        for consumer in consumers {
            match panic::catch_unwind(AssertUnwindSafe(|| consumer.on_event(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    self.stats.consumer_failures.fetch_add(1, Ordering::Relaxed);
                    error!(
                        consumer = consumer.name(),
                        event_id = %event.id(),
                        event_type = %event.event_type(),
                        error = %e,
                        "Event consumer failed"
                    );
                }
                Err(payload) => {
                    self.stats.consumer_failures.fetch_add(1, Ordering::Relaxed);
                    error!(
                        consumer = consumer.name(),
                        event_id = %event.id(),
                        event_type = %event.event_type(),
                        panic = panic_message(payload.as_ref()),
                        "Event consumer panicked"
                    );
                }
            }
        }

        self.stats.dispatched.fetch_add(1, Ordering::Relaxed);

        if event.event_type().is_shutdown() {
            info!(event_id = %event.id(), "Shutdown event delivered, stopping dispatcher");
            return Flow::Stop;
        }
        Flow::Continue
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

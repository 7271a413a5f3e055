//! # Kernel Bus - Event Dispatch for Platform Services
//!
//! A single bounded FIFO queue drained by one dedicated OS thread that fans
//! each event out to the consumers registered for it.
//!
//! ```text
//! ┌──────────────┐  publish()   ┌──────────────┐  dispatch   ┌──────────────┐
//! │  Producer A  │ ───────────→ │ bounded FIFO │ ──────────→ │  Consumer 1  │
//! └──────────────┘              │    queue     │  (thread:   ├──────────────┤
//! ┌──────────────┐  publish()   │              │  event-     │  Consumer 2  │
//! │  Producer B  │ ───────────→ │              │  dispatch)  └──────────────┘
//! └──────────────┘              └──────────────┘
//! ```
//!
//! ## Routing
//!
//! Consumers subscribe with an `(originator, event type)` filter where either
//! side may be a wildcard. For each event the dispatcher concatenates, in
//! order, the consumers registered under:
//!
//! 1. exact originator, exact type
//! 2. exact originator, any type
//! 3. any originator, exact type
//! 4. any originator, any type
//!
//! ## Failure Semantics
//!
//! - A full queue blocks the producer until space frees up; events are never
//!   dropped while the dispatcher is alive.
//! - A failing or panicking consumer is logged and skipped; the remaining
//!   consumers and the dispatch loop are unaffected.
//! - Delivering a `platform.shutdown` event stops the dispatcher.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

mod dispatcher;
pub mod filter;
pub mod publisher;
pub mod subscriber;

pub use filter::SubscriptionKey;
pub use publisher::{BusConfig, BusError, EventBus};
pub use subscriber::{EventConsumer, SubscriptionTable};

/// Maximum events buffered before producers block.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// How long a blocked producer waits before re-checking the queue.
pub const DEFAULT_PUBLISH_RETRY_MS: u64 = 10;

/// Name given to the dispatch thread.
pub const DISPATCH_THREAD_NAME: &str = "event-dispatch";

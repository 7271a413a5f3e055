//! # Kernel Types Crate
//!
//! Entities and ports shared by the kernel's event bus, the token
//! authenticator and the runtime that wires them together.
//!
//! ## Design Principles
//!
//! - **Immutable events**: an `Event` is fixed at construction; the bus only
//!   ever hands out shared references to it.
//! - **Explicit collaborators**: components receive an `EventSink` and a
//!   `TimeSource` from their owner instead of discovering them globally.

pub mod entities;
pub mod ports;

pub use entities::*;
pub use ports::*;

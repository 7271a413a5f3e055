//! # Event Handlers
//!
//! Built-in bus consumers registered by the container.
//!
//! - `LifecycleMonitor`: `platform.*` events
//! - `SecurityAuditor`: `security.*` events

mod lifecycle;
mod security;

pub use lifecycle::{LifecycleMonitor, LifecycleSnapshot};
pub use security::SecurityAuditor;

//! # Collab-Kernel Runtime
//!
//! Configuration, logging and dependency wiring for the kernel services.
//!
//! ## Modular Structure
//!
//! - `config` - TOML file plus `CK_*` environment overrides
//! - `telemetry` - `tracing` subscriber setup
//! - `container` - builds the bus, authenticator and gateway
//! - `credentials` - configured user store
//! - `handlers/` - built-in bus consumers

pub mod config;
pub mod container;
pub mod credentials;
pub mod handlers;
pub mod telemetry;

pub use config::{ConfigError, KernelConfig};
pub use container::KernelContainer;
pub use credentials::StaticCredentials;
pub use handlers::{LifecycleMonitor, SecurityAuditor};

//! # Kernel Container
//!
//! Builds the kernel services from configuration and hands out shared
//! handles. Services that need the bus or the authenticator receive an `Arc`
//! from here instead of looking them up at runtime.
//!
//! ## Initialization Order
//!
//! ```text
//! 1. EventBus           (dispatch thread spawned)
//! 2. TokenAuthenticator (MAC key generated)
//! 3. SessionGateway     (publishes security events to the bus)
//! 4. Built-in handlers  (LifecycleMonitor, SecurityAuditor)
//! ```

use crate::config::KernelConfig;
use crate::credentials::StaticCredentials;
use crate::handlers::{LifecycleMonitor, SecurityAuditor};
use kernel_auth::{CredentialVerifier, SessionGateway, TokenAuthenticator};
use kernel_bus::{BusError, EventBus};
use kernel_types::{ComponentId, Event, EventSink, EventType, SystemTimeSource, TimeSource};
use std::sync::Arc;
use tracing::{info, instrument};

/// Originator of platform lifecycle events.
pub const PLATFORM_COMPONENT: &str = "kernel.platform";

/// Central container holding the kernel services.
pub struct KernelContainer {
    pub config: KernelConfig,
    pub bus: Arc<EventBus>,
    pub auth: Arc<TokenAuthenticator>,
    pub gateway: Arc<SessionGateway>,
    pub lifecycle: Arc<LifecycleMonitor>,
    pub auditor: Arc<SecurityAuditor>,
    component: ComponentId,
}

impl KernelContainer {
    /// Build on the system clock with the configured user store.
    ///
    /// # Errors
    ///
    /// - `BusError` - the bus could not be started
    pub fn new(config: KernelConfig) -> Result<Self, BusError> {
        let verifier = Arc::new(StaticCredentials::from_entries(&config.credentials));
        Self::with_parts(config, Arc::new(SystemTimeSource), verifier)
    }

    /// Build with an explicit clock and credential store.
    ///
    /// # Errors
    ///
    /// - `BusError` - the bus could not be started
    #[instrument(skip_all, fields(bus_capacity = config.bus.capacity))]
    pub fn with_parts(
        config: KernelConfig,
        time: Arc<dyn TimeSource>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Result<Self, BusError> {
        let bus = Arc::new(EventBus::start(config.bus.to_bus_config())?);

        let auth = Arc::new(TokenAuthenticator::new(config.auth.clone(), time));
        info!(
            max_login_failure = config.auth.max_login_failure,
            ban_length_secs = config.auth.ban_length_secs,
            token_ttl_secs = config.auth.token_ttl_secs,
            "Token authenticator ready"
        );

        let sink: Arc<dyn EventSink> = bus.clone();
        let gateway = Arc::new(SessionGateway::new(Arc::clone(&auth), verifier).with_events(sink));

        let lifecycle = Arc::new(LifecycleMonitor::new());
        bus.subscribe(lifecycle.clone(), None, Some(EventType::PLATFORM_STARTED.into()));
        bus.subscribe(lifecycle.clone(), None, Some(EventType::PLATFORM_SHUTDOWN.into()));

        let auditor = Arc::new(SecurityAuditor::new());
        bus.subscribe(auditor.clone(), None, Some(EventType::LOGIN_FAILED.into()));
        bus.subscribe(auditor.clone(), None, Some(EventType::CLIENT_BANNED.into()));

        Ok(Self {
            config,
            bus,
            auth,
            gateway,
            lifecycle,
            auditor,
            component: ComponentId::new(PLATFORM_COMPONENT),
        })
    }

    /// Announce that the platform is up.
    pub fn start(&self) {
        self.bus.publish(Event::platform_started(self.component.clone()));
    }

    /// Publish the shutdown sentinel and wait for the bus to drain.
    pub fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        self.bus
            .publish(Event::platform_shutdown(self.component.clone()));
        self.bus.close();
        info!(
            dispatched = self.bus.events_dispatched(),
            consumer_failures = self.bus.consumer_failures(),
            "Shutdown complete"
        );
    }
}

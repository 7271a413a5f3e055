//! Security auditor: counts and logs failed logins and bans.

use kernel_bus::EventConsumer;
use kernel_types::{Event, EventType};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, warn};

/// Bounded history kept for inspection.
const RECENT_LIMIT: usize = 64;

/// Audit log for `security.*` events.
///
/// Stands in for the platform services (bot management and friends) that
/// react to failed logins and bans.
#[derive(Debug, Default)]
pub struct SecurityAuditor {
    login_failures: AtomicU64,
    bans: AtomicU64,
    recent: Mutex<VecDeque<String>>,
}

impl SecurityAuditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn login_failures(&self) -> u64 {
        self.login_failures.load(Ordering::Relaxed)
    }

    pub fn bans(&self) -> u64 {
        self.bans.load(Ordering::Relaxed)
    }

    /// Descriptions of the most recent security events, oldest first.
    pub fn recent(&self) -> Vec<String> {
        self.recent.lock().iter().cloned().collect()
    }

    fn remember(&self, event: &Event) {
        let mut recent = self.recent.lock();
        if recent.len() == RECENT_LIMIT {
            recent.pop_front();
        }
        recent.push_back(event.description().to_string());
    }
}

impl EventConsumer for SecurityAuditor {
    fn on_event(&self, event: &Event) -> anyhow::Result<()> {
        match event.event_type().as_str() {
            EventType::LOGIN_FAILED => {
                self.login_failures.fetch_add(1, Ordering::Relaxed);
                warn!(originator = ?event.originator(), "{}", event.description());
            }
            EventType::CLIENT_BANNED => {
                self.bans.fetch_add(1, Ordering::Relaxed);
                error!(originator = ?event.originator(), "{}", event.description());
            }
            _ => return Ok(()),
        }
        self.remember(event);
        Ok(())
    }

    fn name(&self) -> &str {
        "security-auditor"
    }
}

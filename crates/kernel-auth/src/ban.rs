//! Per-client login failure tracking and temporary bans.
//!
//! ```text
//! CLEAN ──failure──→ ACCUMULATING(n) ──n ≥ max──→ BANNED ──window elapsed──→ CLEAN
//! ```
//!
//! Expired bans are evicted lazily, the next time the client is looked at.
//! There is no background sweep.

use crate::config::AuthConfig;
use kernel_types::{TimeSource, Timestamp};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Login history of one client address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientLoginState {
    /// Failures since the last ban expiry.
    pub failed_attempts: u32,
    /// When the ban was applied, if banned.
    pub banned_at: Option<Timestamp>,
}

impl ClientLoginState {
    fn ban_active(&self, now: Timestamp, ban_length: Timestamp) -> bool {
        self.banned_at
            .is_some_and(|at| now.saturating_sub(at) < ban_length)
    }
}

/// Tracks failures and bans for every client that has failed a login.
pub struct BanList {
    clients: Mutex<HashMap<String, ClientLoginState>>,
    max_login_failure: u32,
    ban_length: Timestamp,
    trusted: HashSet<String>,
    trust_loopback: bool,
    time: Arc<dyn TimeSource>,
}

impl BanList {
    pub fn new(config: &AuthConfig, time: Arc<dyn TimeSource>) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            max_login_failure: config.max_login_failure,
            ban_length: config.ban_length_millis(),
            trusted: config.trusted_clients.iter().cloned().collect(),
            trust_loopback: config.trust_loopback,
            time,
        }
    }

    /// Record a failed login. Returns `true` if this failure applied a new ban.
    ///
    /// A client already inside its ban window is left untouched, so repeated
    /// failures never extend the ban. Trusted clients are never banned.
    pub fn record_login_failure(&self, client: &str) -> bool {
        if self.is_trusted(client) {
            debug!(client, "Login failure from trusted client, not counted");
            return false;
        }

        let now = self.time.now();
        let mut clients = self.clients.lock();
        let state = clients.entry(client.to_string()).or_default();

        if state.banned_at.is_some() {
            if state.ban_active(now, self.ban_length) {
                debug!(client, "Login failure from banned client");
                return false;
            }
            *state = ClientLoginState::default();
        }

        state.failed_attempts = state.failed_attempts.saturating_add(1);

        if state.failed_attempts >= self.max_login_failure {
            state.banned_at = Some(now);
            warn!(
                client,
                failed_attempts = state.failed_attempts,
                ban_length_ms = self.ban_length,
                "Client banned after repeated login failures"
            );
            return true;
        }

        info!(
            client,
            failed_attempts = state.failed_attempts,
            max = self.max_login_failure,
            "Login failure recorded"
        );
        false
    }

    /// Whether the client is inside its ban window.
    ///
    /// An elapsed ban is evicted here, clearing the failure count.
    pub fn is_banned(&self, client: &str) -> bool {
        let now = self.time.now();
        let mut clients = self.clients.lock();

        let Some(state) = clients.get(client) else {
            return false;
        };
        if state.banned_at.is_none() {
            return false;
        }
        if state.ban_active(now, self.ban_length) {
            return true;
        }

        clients.remove(client);
        info!(client, "Ban expired, client state cleared");
        false
    }

    /// Current record for a client, without evicting anything.
    pub fn state(&self, client: &str) -> Option<ClientLoginState> {
        self.clients.lock().get(client).copied()
    }

    /// Failures currently counted against a client.
    pub fn failed_attempts(&self, client: &str) -> u32 {
        self.state(client).map_or(0, |s| s.failed_attempts)
    }

    /// Number of clients with a stored record.
    pub fn tracked_clients(&self) -> usize {
        self.clients.lock().len()
    }

    /// Trusted clients are exempt from bans.
    pub fn is_trusted(&self, client: &str) -> bool {
        if self.trusted.contains(client) {
            return true;
        }
        self.trust_loopback
            && client
                .parse::<IpAddr>()
                .is_ok_and(|ip| ip.is_loopback())
    }
}

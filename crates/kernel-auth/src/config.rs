//! Authenticator configuration.

use serde::Deserialize;

/// Login, ban and cookie parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Failed logins before a client is banned.
    pub max_login_failure: u32,
    /// Ban window length in seconds.
    pub ban_length_secs: u64,
    /// Lifetime of issued session tokens in seconds.
    pub token_ttl_secs: u64,
    /// Client addresses that are never banned.
    pub trusted_clients: Vec<String>,
    /// Treat every loopback IP as trusted.
    pub trust_loopback: bool,
    /// Name of the session cookie.
    pub cookie_name: String,
    /// Path attribute of the session cookie.
    pub cookie_path: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            max_login_failure: 5,
            ban_length_secs: 300,
            token_ttl_secs: 3600,
            trusted_clients: vec!["127.0.0.1".to_string(), "::1".to_string(), "localhost".to_string()],
            trust_loopback: true,
            cookie_name: "collab_token".to_string(),
            cookie_path: "/".to_string(),
        }
    }
}

impl AuthConfig {
    /// Ban window in milliseconds.
    #[must_use]
    pub fn ban_length_millis(&self) -> i64 {
        i64::try_from(self.ban_length_secs.saturating_mul(1000)).unwrap_or(i64::MAX)
    }
}

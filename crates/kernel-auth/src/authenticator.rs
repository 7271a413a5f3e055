//! # Token Authenticator
//!
//! Turns a verified login into a time-bounded bearer token, turns a
//! presented token back into an identity, and rate-limits failed logins per
//! client.

use crate::ban::BanList;
use crate::config::AuthConfig;
use crate::errors::AuthError;
use crate::token::{TokenClaims, TokenSigner};
use kernel_types::{SystemTimeSource, TimeSource};
use std::sync::Arc;
use tracing::debug;

/// Token issuing/validation plus client ban tracking.
pub struct TokenAuthenticator {
    signer: TokenSigner,
    bans: BanList,
    config: AuthConfig,
}

impl TokenAuthenticator {
    /// Build with an explicit time source.
    pub fn new(config: AuthConfig, time: Arc<dyn TimeSource>) -> Self {
        Self {
            signer: TokenSigner::new(Arc::clone(&time)),
            bans: BanList::new(&config, time),
            config,
        }
    }

    /// Build on the system clock.
    pub fn with_system_clock(config: AuthConfig) -> Self {
        Self::new(config, Arc::new(SystemTimeSource))
    }

    /// Issue a token for `login` valid for `ttl_secs`.
    ///
    /// # Errors
    ///
    /// - `AuthError::EmptyLogin`
    pub fn issue_token(&self, login: &str, ttl_secs: u64) -> Result<String, AuthError> {
        let token = self.signer.issue(login, ttl_secs)?;
        debug!(login, ttl_secs, "Token issued");
        Ok(token)
    }

    /// Issue a token with the configured session lifetime.
    ///
    /// # Errors
    ///
    /// - `AuthError::EmptyLogin`
    pub fn issue_session_token(&self, login: &str) -> Result<String, AuthError> {
        self.issue_token(login, self.config.token_ttl_secs)
    }

    /// Validate a token and return the login it was issued for.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidToken`
    /// - `AuthError::ExpiredToken`
    pub fn validate_token(&self, token: &str) -> Result<String, AuthError> {
        self.validate_claims(token).map(|claims| claims.login)
    }

    /// Validate a token and return all of its claims.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidToken`
    /// - `AuthError::ExpiredToken`
    pub fn validate_claims(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.signer.validate(token)
    }

    /// Record a failed login; `true` if a ban was newly applied.
    pub fn record_login_failure(&self, client: &str) -> bool {
        self.bans.record_login_failure(client)
    }

    /// Whether the client is currently banned.
    pub fn is_banned(&self, client: &str) -> bool {
        self.bans.is_banned(client)
    }

    /// Gate to run before checking credentials.
    ///
    /// # Errors
    ///
    /// - `AuthError::ClientBanned` - the client is inside its ban window
    pub fn ensure_not_banned(&self, client: &str) -> Result<(), AuthError> {
        if self.is_banned(client) {
            return Err(AuthError::ClientBanned {
                client: client.to_string(),
            });
        }
        Ok(())
    }

    pub fn bans(&self) -> &BanList {
        &self.bans
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

//! # Bearer Tokens
//!
//! Stateless, HMAC-signed session tokens.
//!
//! ## Wire Format
//!
//! ```text
//! base64( login (utf-8) || expires_at (i64, big-endian, 8 bytes) || HMAC-SHA256 (32 bytes) )
//! ```
//!
//! The MAC covers `login || expires_at`. Nothing is stored server-side; a
//! token is valid iff its MAC verifies under this signer's key and its
//! expiry has not passed.
//!
//! ## Key Lifetime
//!
//! The key is drawn from the OS RNG when the signer is built and never
//! leaves memory. Restarting the process invalidates every outstanding token.

use crate::errors::AuthError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use kernel_types::{TimeSource, Timestamp};
use rand::RngCore;
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256 = Hmac<Sha256>;

/// MAC length in bytes.
pub const MAC_LEN: usize = 32;

/// Length of the big-endian expiry field.
pub const EXPIRY_LEN: usize = 8;

/// Process-lifetime MAC key (256-bit).
#[derive(Zeroize, ZeroizeOnDrop)]
struct MacKey([u8; 32]);

impl MacKey {
    fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }
}

/// Verified contents of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Authenticated subject.
    pub login: String,
    /// Expiry, epoch millis.
    pub expires_at: Timestamp,
}

/// Issues and validates bearer tokens.
pub struct TokenSigner {
    /// Keyed MAC prototype. Cloned per computation, so concurrent callers
    /// never share MAC state.
    mac: HmacSha256,
    time: Arc<dyn TimeSource>,
}

impl TokenSigner {
    /// Create a signer with a freshly generated key.
    pub fn new(time: Arc<dyn TimeSource>) -> Self {
        let key = MacKey::generate();
        Self::with_key(&key.0, time)
    }

    fn with_key(key: &[u8], time: Arc<dyn TimeSource>) -> Self {
        let mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
        Self { mac, time }
    }

    /// Issue a token for `login` valid for `ttl_secs` from now.
    ///
    /// # Errors
    ///
    /// - `AuthError::EmptyLogin` - such a token could never validate
    pub fn issue(&self, login: &str, ttl_secs: u64) -> Result<String, AuthError> {
        if login.is_empty() {
            return Err(AuthError::EmptyLogin);
        }

        let ttl_millis = Timestamp::try_from(ttl_secs.saturating_mul(1000)).unwrap_or(Timestamp::MAX);
        let expires_at = self.time.now().saturating_add(ttl_millis);

        let mut bytes = Vec::with_capacity(login.len() + EXPIRY_LEN + MAC_LEN);
        bytes.extend_from_slice(login.as_bytes());
        bytes.extend_from_slice(&expires_at.to_be_bytes());
        let tag = self.compute_mac(&bytes);
        bytes.extend_from_slice(&tag);

        Ok(STANDARD.encode(bytes))
    }

    /// Validate a token and return its claims.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidToken` - not base64, too short, MAC mismatch, or
    ///   a login that is not UTF-8
    /// - `AuthError::ExpiredToken` - MAC verifies but the expiry has passed
    pub fn validate(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let bytes = STANDARD
            .decode(token.trim())
            .map_err(|_| AuthError::InvalidToken)?;

        if bytes.len() <= MAC_LEN + EXPIRY_LEN {
            return Err(AuthError::InvalidToken);
        }

        let (payload, provided) = bytes.split_at(bytes.len() - MAC_LEN);
        let expected = self.compute_mac(payload);
        if !bool::from(expected.as_slice().ct_eq(provided)) {
            return Err(AuthError::InvalidToken);
        }

        let (login, expiry) = payload.split_at(payload.len() - EXPIRY_LEN);
        let mut expiry_bytes = [0u8; EXPIRY_LEN];
        expiry_bytes.copy_from_slice(expiry);
        let expires_at = Timestamp::from_be_bytes(expiry_bytes);

        if self.time.now() > expires_at {
            return Err(AuthError::ExpiredToken {
                expired_at: expires_at,
            });
        }

        let login = String::from_utf8(login.to_vec()).map_err(|_| AuthError::InvalidToken)?;
        Ok(TokenClaims { login, expires_at })
    }

    fn compute_mac(&self, payload: &[u8]) -> [u8; MAC_LEN] {
        let mut mac = self.mac.clone();
        mac.update(payload);
        mac.finalize().into_bytes().into()
    }
}

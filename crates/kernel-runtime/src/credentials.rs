//! Configured user store for development deployments.

use crate::config::CredentialEntry;
use kernel_auth::CredentialVerifier;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use subtle::ConstantTimeEq;

type PasswordDigest = [u8; 32];

/// Verifier backed by the `[[credentials]]` config entries.
///
/// Only SHA-256 digests of the passwords are kept in memory.
#[derive(Default)]
pub struct StaticCredentials {
    users: HashMap<String, PasswordDigest>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: &[CredentialEntry]) -> Self {
        let mut credentials = Self::new();
        for entry in entries {
            credentials.insert(&entry.login, &entry.password);
        }
        credentials
    }

    /// Add or replace a user.
    pub fn insert(&mut self, login: &str, password: &str) {
        self.users.insert(login.to_string(), digest(password));
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify(&self, login: &str, password: &str) -> bool {
        let presented = digest(password);
        match self.users.get(login) {
            Some(stored) => bool::from(stored[..].ct_eq(&presented[..])),
            None => false,
        }
    }
}

fn digest(password: &str) -> PasswordDigest {
    Sha256::digest(password.as_bytes()).into()
}

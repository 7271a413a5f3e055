//! Session cookie formatting and token extraction from request headers.

use crate::config::AuthConfig;
use http::header::{AUTHORIZATION, COOKIE};
use http::HeaderMap;

/// Builds `Set-Cookie` values for the session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    name: String,
    path: String,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.cookie_name, &config.cookie_path)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cookie carrying a freshly issued token.
    pub fn issue(&self, token: &str, max_age_secs: u64) -> String {
        format!(
            "{}={}; Max-Age={}; Path={}; Secure; HttpOnly",
            self.name, token, max_age_secs, self.path
        )
    }

    /// Cookie that makes the browser discard the session.
    pub fn expire(&self) -> String {
        format!("{}=; Max-Age=0; Path={}; Secure; HttpOnly", self.name, self.path)
    }

    /// Find the session token in a `Cookie` header value.
    pub fn token_from_cookie_header(&self, header: &str) -> Option<String> {
        header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.name)
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Token from the session cookie, falling back to `Authorization: Bearer`.
    pub fn token_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        let from_cookie = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|value| self.token_from_cookie_header(value));
        if from_cookie.is_some() {
            return from_cookie;
        }

        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }
}

impl Default for SessionCookie {
    fn default() -> Self {
        Self::from_config(&AuthConfig::default())
    }
}

//! Request-scoped identity, passed explicitly through handler calls.

use crate::cookie::SessionCookie;
use http::HeaderMap;
use std::fmt;

/// What a handler knows about the caller of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Client address used for ban tracking.
    pub client_addr: String,
    /// Bearer token presented with the request, if any.
    pub token: Option<String>,
}

impl RequestContext {
    pub fn new(client_addr: impl Into<String>) -> Self {
        Self {
            client_addr: client_addr.into(),
            token: None,
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Build from request headers, reading the token from the session
    /// cookie or an `Authorization: Bearer` header.
    pub fn from_headers(
        client_addr: impl Into<String>,
        headers: &HeaderMap,
        cookie: &SessionCookie,
    ) -> Self {
        Self {
            client_addr: client_addr.into(),
            token: cookie.token_from_headers(headers),
        }
    }
}

/// A verified identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub login: String,
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.login)
    }
}

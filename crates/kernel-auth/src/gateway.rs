//! # Session Endpoints
//!
//! Framework-agnostic login / logout / who-am-i handlers. An HTTP server
//! adapter extracts the method, client address and headers, calls into the
//! gateway and copies the returned status and `Set-Cookie` value back out.
//!
//! ## Status Mapping
//!
//! | Outcome | Status |
//! |---------|--------|
//! | success | 200 |
//! | bad credentials, banned client, bad/expired token | 401 |
//! | wrong verb | 405 |
//!
//! A banned client gets exactly the response a bad password gets.

use crate::authenticator::TokenAuthenticator;
use crate::context::{Principal, RequestContext};
use crate::cookie::SessionCookie;
use http::header::SET_COOKIE;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use kernel_types::{ComponentId, Event, EventSink, EventType};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Component id used as originator for security events.
pub const GATEWAY_COMPONENT: &str = "kernel.auth";

/// Checks a login/password pair against the platform's user store.
///
/// The host provides the implementation; the gateway only needs a yes/no.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, login: &str, password: &str) -> bool;
}

/// Login form contents.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// What the HTTP adapter should send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub principal: Option<Principal>,
}

impl GatewayResponse {
    fn ok(principal: Option<Principal>, set_cookie: Option<String>) -> Self {
        Self {
            status: StatusCode::OK,
            set_cookie,
            principal,
        }
    }

    fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            set_cookie: None,
            principal: None,
        }
    }

    fn method_not_allowed() -> Self {
        Self {
            status: StatusCode::METHOD_NOT_ALLOWED,
            set_cookie: None,
            principal: None,
        }
    }

    /// Response headers (currently only `Set-Cookie`).
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = &self.set_cookie {
            match HeaderValue::from_str(cookie) {
                Ok(value) => {
                    headers.insert(SET_COOKIE, value);
                }
                Err(e) => warn!(error = %e, "Set-Cookie value is not a valid header"),
            }
        }
        headers
    }
}

/// Login, logout and who-am-i over a shared authenticator.
pub struct SessionGateway {
    auth: Arc<TokenAuthenticator>,
    verifier: Arc<dyn CredentialVerifier>,
    cookie: SessionCookie,
    events: Option<Arc<dyn EventSink>>,
    component: ComponentId,
}

impl SessionGateway {
    pub fn new(auth: Arc<TokenAuthenticator>, verifier: Arc<dyn CredentialVerifier>) -> Self {
        let cookie = SessionCookie::from_config(auth.config());
        Self {
            auth,
            verifier,
            cookie,
            events: None,
            component: ComponentId::new(GATEWAY_COMPONENT),
        }
    }

    /// Publish `security.*` events to this sink.
    #[must_use]
    pub fn with_events(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = Some(sink);
        self
    }

    pub fn cookie(&self) -> &SessionCookie {
        &self.cookie
    }

    /// `POST` login.
    ///
    /// Banned clients are rejected before the credentials are looked at.
    pub fn login(
        &self,
        method: &Method,
        ctx: &RequestContext,
        credentials: &Credentials,
    ) -> GatewayResponse {
        if *method != Method::POST {
            return GatewayResponse::method_not_allowed();
        }

        if let Err(e) = self.auth.ensure_not_banned(&ctx.client_addr) {
            warn!(client = %ctx.client_addr, login = %credentials.login, error = %e, "Login refused");
            return GatewayResponse::unauthorized();
        }

        if !self.verifier.verify(&credentials.login, &credentials.password) {
            self.on_failure(ctx, &credentials.login);
            return GatewayResponse::unauthorized();
        }

        match self.auth.issue_session_token(&credentials.login) {
            Ok(token) => {
                info!(client = %ctx.client_addr, login = %credentials.login, "Login succeeded");
                let cookie = self.cookie.issue(&token, self.auth.config().token_ttl_secs);
                GatewayResponse::ok(
                    Some(Principal {
                        login: credentials.login.clone(),
                    }),
                    Some(cookie),
                )
            }
            Err(e) => {
                warn!(client = %ctx.client_addr, error = %e, "Token could not be issued");
                GatewayResponse::unauthorized()
            }
        }
    }

    /// `POST` logout. Clears the cookie; tokens themselves stay valid until
    /// they expire.
    pub fn logout(&self, method: &Method, ctx: &RequestContext) -> GatewayResponse {
        if *method != Method::POST {
            return GatewayResponse::method_not_allowed();
        }
        debug!(client = %ctx.client_addr, "Logout");
        GatewayResponse::ok(None, Some(self.cookie.expire()))
    }

    /// `GET` who-am-i.
    pub fn who_am_i(&self, method: &Method, ctx: &RequestContext) -> GatewayResponse {
        if *method != Method::GET {
            return GatewayResponse::method_not_allowed();
        }

        match self.authenticate(ctx) {
            Some(principal) => GatewayResponse::ok(Some(principal), None),
            None => GatewayResponse::unauthorized(),
        }
    }

    /// Resolve the request's token to a principal.
    pub fn authenticate(&self, ctx: &RequestContext) -> Option<Principal> {
        let token = ctx.token.as_deref()?;
        match self.auth.validate_token(token) {
            Ok(login) => Some(Principal { login }),
            Err(e) => {
                debug!(client = %ctx.client_addr, error = %e, "Token rejected");
                None
            }
        }
    }

    fn on_failure(&self, ctx: &RequestContext, login: &str) {
        let newly_banned = self.auth.record_login_failure(&ctx.client_addr);
        warn!(client = %ctx.client_addr, login, newly_banned, "Login failed");

        let Some(events) = &self.events else {
            return;
        };
        events.publish(Event::new(
            Some(self.component.clone()),
            EventType::LOGIN_FAILED,
            format!("Login failed for '{}' from {}", login, ctx.client_addr),
        ));
        if newly_banned {
            events.publish(Event::new(
                Some(self.component.clone()),
                EventType::CLIENT_BANNED,
                format!("Client {} banned", ctx.client_addr),
            ));
        }
    }
}

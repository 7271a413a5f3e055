//! # Session Flows
//!
//! Login, ban and who-am-i through the runtime container, with security
//! events travelling over the real bus to the auditor.

#[cfg(test)]
mod tests {
    use http::header::{COOKIE, SET_COOKIE};
    use http::{HeaderMap, HeaderValue, Method, StatusCode};
    use kernel_auth::{
        AuthConfig, AuthError, Credentials, GatewayResponse, RequestContext, TokenAuthenticator,
    };
    use kernel_runtime::{KernelConfig, KernelContainer, StaticCredentials};
    use kernel_types::ManualTimeSource;
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    const T0: i64 = 1_700_000_000_000;
    const ATTACKER: &str = "198.51.100.23";

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn container_with_clock() -> (KernelContainer, Arc<ManualTimeSource>) {
        let clock = Arc::new(ManualTimeSource::new(T0));
        let mut config = KernelConfig::default();
        config.auth.max_login_failure = 3;
        config.auth.ban_length_secs = 300;
        config.auth.token_ttl_secs = 3600;

        let mut users = StaticCredentials::new();
        users.insert("alice", "wonderland");

        let container =
            KernelContainer::with_parts(config, clock.clone(), Arc::new(users)).unwrap();
        (container, clock)
    }

    /// Replay the `Set-Cookie` of a response as the browser would.
    fn browser_headers(response: &GatewayResponse) -> HeaderMap {
        let set_cookie = response.headers();
        let value = set_cookie.get(SET_COOKIE).unwrap().to_str().unwrap();
        let pair = value.split(';').next().unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(pair).unwrap());
        headers
    }

    // =============================================================================
    // LOGIN → WHO AM I
    // =============================================================================

    #[test]
    fn test_login_cookie_identifies_user() {
        let (container, _) = container_with_clock();
        let gateway = &container.gateway;

        let login = gateway.login(
            &Method::POST,
            &RequestContext::new("10.0.0.5"),
            &Credentials::new("alice", "wonderland"),
        );
        assert_eq!(login.status, StatusCode::OK);

        let ctx = RequestContext::from_headers("10.0.0.5", &browser_headers(&login), gateway.cookie());
        let me = gateway.who_am_i(&Method::GET, &ctx);
        assert_eq!(me.status, StatusCode::OK);
        assert_eq!(me.principal.unwrap().login, "alice");

        let logout = gateway.logout(&Method::POST, &ctx);
        assert!(logout.set_cookie.unwrap().contains("Max-Age=0"));
    }

    #[test]
    fn test_bearer_header_identifies_user() {
        let (container, _) = container_with_clock();
        let token = container.auth.issue_session_token("alice").unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        let ctx = RequestContext::from_headers("10.0.0.5", &headers, container.gateway.cookie());

        assert_eq!(
            container.gateway.authenticate(&ctx).map(|p| p.login),
            Some("alice".to_string())
        );
    }

    #[test]
    fn test_session_expires_with_token_ttl() {
        let (container, clock) = container_with_clock();
        let login = container.gateway.login(
            &Method::POST,
            &RequestContext::new("10.0.0.5"),
            &Credentials::new("alice", "wonderland"),
        );
        let ctx = RequestContext::from_headers(
            "10.0.0.5",
            &browser_headers(&login),
            container.gateway.cookie(),
        );

        clock.advance(Duration::from_secs(3600));
        assert_eq!(container.gateway.who_am_i(&Method::GET, &ctx).status, StatusCode::OK);

        clock.advance(Duration::from_secs(1));
        assert_eq!(
            container.gateway.who_am_i(&Method::GET, &ctx).status,
            StatusCode::UNAUTHORIZED
        );
    }

    // =============================================================================
    // BAN LIFECYCLE
    // =============================================================================

    /// Three failures ban the client. A login inside the window is refused
    /// without moving the window, and afterwards the right password works.
    #[test]
    fn test_ban_lifecycle_and_security_events() {
        let (container, clock) = container_with_clock();
        let gateway = &container.gateway;
        let ctx = RequestContext::new(ATTACKER);
        let wrong = Credentials::new("alice", "guess");
        let right = Credentials::new("alice", "wonderland");

        for _ in 0..3 {
            assert_eq!(gateway.login(&Method::POST, &ctx, &wrong).status, StatusCode::UNAUTHORIZED);
        }
        assert!(container.auth.is_banned(ATTACKER));

        clock.advance(Duration::from_secs(30));
        assert_eq!(gateway.login(&Method::POST, &ctx, &right).status, StatusCode::UNAUTHORIZED);

        // Ban timer still counts from the third failure
        clock.advance(Duration::from_secs(271));
        assert!(!container.auth.is_banned(ATTACKER));
        assert_eq!(gateway.login(&Method::POST, &ctx, &right).status, StatusCode::OK);

        container.shutdown();
        assert_eq!(container.auditor.login_failures(), 3);
        assert_eq!(container.auditor.bans(), 1);
        assert!(container.auditor.recent().last().unwrap().contains(ATTACKER));
    }

    #[test]
    fn test_loopback_admin_never_locked_out() {
        let (container, _) = container_with_clock();
        let ctx = RequestContext::new("127.0.0.1");

        for _ in 0..10 {
            container
                .gateway
                .login(&Method::POST, &ctx, &Credentials::new("alice", "typo"));
        }
        let response = container
            .gateway
            .login(&Method::POST, &ctx, &Credentials::new("alice", "wonderland"));

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(container.auth.bans().tracked_clients(), 0);
    }

    // =============================================================================
    // RESTART / CONFIG
    // =============================================================================

    /// A new process has a new key; old tokens stop validating.
    #[test]
    fn test_restart_invalidates_tokens() {
        let clock = Arc::new(ManualTimeSource::new(T0));
        let before = TokenAuthenticator::new(AuthConfig::default(), clock.clone());
        let token = before.issue_token("alice", 600).unwrap();

        let after = TokenAuthenticator::new(AuthConfig::default(), clock);
        assert_eq!(after.validate_token(&token), Err(AuthError::InvalidToken));
        assert_eq!(before.validate_token(&token).unwrap(), "alice");
    }

    #[test]
    fn test_configured_credentials_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[auth]
max_login_failure = 2
cookie_name = "ck_session"

[[credentials]]
login = "bob"
password = "builder"
"#
        )
        .unwrap();

        let config = KernelConfig::from_file(file.path()).unwrap();
        config.validate().unwrap();
        let container = KernelContainer::new(config).unwrap();

        let response = container.gateway.login(
            &Method::POST,
            &RequestContext::new("10.0.0.9"),
            &Credentials::new("bob", "builder"),
        );
        assert_eq!(response.status, StatusCode::OK);
        assert!(response.set_cookie.unwrap().starts_with("ck_session="));
    }
}

//! # Password Brute Force
//!
//! **Attack:** one client cycles through a password list against the login
//! endpoint, then checks whether it is banned by comparing responses.
//!
//! **Defence:** after `max_login_failure` failures the client is banned and
//! the credential store is no longer consulted. Banned and bad-password
//! responses are identical.

#[cfg(test)]
mod tests {
    use http::{Method, StatusCode};
    use kernel_auth::{
        AuthConfig, CredentialVerifier, Credentials, RequestContext, SessionGateway,
        TokenAuthenticator,
    };
    use kernel_types::ManualTimeSource;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    /// Counts how often the credential store is actually consulted.
    #[derive(Default)]
    struct CountingVerifier {
        calls: AtomicUsize,
    }

    impl CredentialVerifier for CountingVerifier {
        fn verify(&self, login: &str, password: &str) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            login == "admin" && password == "correct horse battery staple"
        }
    }

    fn gateway(max_login_failure: u32) -> (SessionGateway, Arc<CountingVerifier>) {
        let config = AuthConfig {
            max_login_failure,
            ban_length_secs: 600,
            ..AuthConfig::default()
        };
        let auth = Arc::new(TokenAuthenticator::new(
            config,
            Arc::new(ManualTimeSource::new(1_700_000_000_000)),
        ));
        let verifier = Arc::new(CountingVerifier::default());
        (SessionGateway::new(auth, verifier.clone()), verifier)
    }

    #[test]
    fn test_dictionary_attack_is_cut_off() {
        let (gateway, verifier) = gateway(5);
        let ctx = RequestContext::new("203.0.113.66");

        let mut successes = 0;
        for i in 0..1_000 {
            let guess = if i == 999 {
                "correct horse battery staple".to_string()
            } else {
                format!("password{i}")
            };
            let response = gateway.login(&Method::POST, &ctx, &Credentials::new("admin", guess));
            if response.status == StatusCode::OK {
                successes += 1;
            }
        }

        assert_eq!(successes, 0, "the right guess arrived after the ban");
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_ban_is_not_observable() {
        let (gateway, _) = gateway(2);
        let ctx = RequestContext::new("203.0.113.66");
        let wrong = Credentials::new("admin", "nope");
        let right = Credentials::new("admin", "correct horse battery staple");

        let before_ban = gateway.login(&Method::POST, &ctx, &wrong);
        gateway.login(&Method::POST, &ctx, &wrong);
        let banned_wrong = gateway.login(&Method::POST, &ctx, &wrong);
        let banned_right = gateway.login(&Method::POST, &ctx, &right);

        assert_eq!(before_ban, banned_wrong);
        assert_eq!(before_ban, banned_right);
        assert_eq!(before_ban.headers(), banned_right.headers());
    }

    /// Parallel guesses from one client cannot slip extra attempts past the
    /// threshold.
    #[test]
    fn test_parallel_guessing_respects_threshold() {
        let (gateway, verifier) = gateway(5);
        let gateway = Arc::new(gateway);

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let gateway = Arc::clone(&gateway);
                thread::spawn(move || {
                    let ctx = RequestContext::new("203.0.113.66");
                    for i in 0..50 {
                        gateway.login(
                            &Method::POST,
                            &ctx,
                            &Credentials::new("admin", format!("t{t}-{i}")),
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // The ban check and the verifier call are not one atomic step, so a
        // few in-flight guesses may land; the failure count itself is exact.
        let calls = verifier.calls.load(Ordering::SeqCst);
        assert!((5..5 + 8).contains(&calls), "verifier consulted {calls} times");
    }

    /// Bans are per client address: rotating addresses is not stopped here.
    #[test]
    fn test_distributed_attack_is_per_client() {
        let (gateway, verifier) = gateway(3);
        for host in 1..=10 {
            let ctx = RequestContext::new(format!("192.0.2.{host}"));
            for _ in 0..3 {
                gateway.login(&Method::POST, &ctx, &Credentials::new("admin", "guess"));
            }
        }
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 30);
    }
}

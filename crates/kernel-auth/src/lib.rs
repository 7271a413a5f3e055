//! # Kernel Authentication
//!
//! Stateless bearer tokens plus a per-client login failure tracker.
//!
//! Tokens are `base64(login || expiry || mac)`; see [`token`] for the
//! layout. The MAC key is random per process, so every token dies on restart.
//!
//! ## Security Properties
//!
//! | Property | Mechanism |
//! |----------|-----------|
//! | Tamper detection | HMAC-SHA256 over expiry and login |
//! | Timing safety | constant-time MAC comparison |
//! | Key hygiene | key zeroized on drop |
//! | Brute-force limit | ban after `max_login_failure` failures |
//! | No ban oracle | banned and bad-credential logins both answer 401 |

pub mod authenticator;
pub mod ban;
pub mod config;
pub mod context;
pub mod cookie;
pub mod errors;
pub mod gateway;
pub mod token;

pub use authenticator::TokenAuthenticator;
pub use ban::{BanList, ClientLoginState};
pub use config::AuthConfig;
pub use context::{Principal, RequestContext};
pub use cookie::SessionCookie;
pub use errors::AuthError;
pub use gateway::{CredentialVerifier, Credentials, GatewayResponse, SessionGateway};
pub use token::{TokenClaims, TokenSigner};

//! Authentication error types.

use http::StatusCode;
use thiserror::Error;

/// Failures surfaced by the token authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Malformed, truncated or MAC-mismatched token.
    #[error("Invalid token")]
    InvalidToken,

    /// Structurally valid token past its expiry.
    #[error("Token expired at {expired_at}")]
    ExpiredToken {
        /// Expiry carried by the token, epoch millis.
        expired_at: i64,
    },

    /// The client is inside its ban window; credentials were not checked.
    #[error("Client {client} is banned")]
    ClientBanned {
        /// Client address.
        client: String,
    },

    /// Tokens cannot be issued for an empty login.
    #[error("Login must not be empty")]
    EmptyLogin,
}

impl AuthError {
    /// HTTP status for this failure.
    ///
    /// Every authentication failure maps to 401 so a banned client cannot
    /// tell the ban apart from a bad credential.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidToken | Self::ExpiredToken { .. } | Self::ClientBanned { .. } => {
                StatusCode::UNAUTHORIZED
            }
            Self::EmptyLogin => StatusCode::BAD_REQUEST,
        }
    }
}

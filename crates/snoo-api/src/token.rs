//! Login tokens and their expiry.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Username and password posted to the login endpoint.
#[derive(Clone, Serialize)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Response of a successful login.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct TokenSession {
    pub access_token: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: String,
}

impl fmt::Debug for TokenSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSession")
            .field("access_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// The current token and the instant it stops being usable.
///
/// A new cache has no token and an expiry at the minimum representable
/// time, so it is never valid until a session is stored.
#[derive(Debug, Clone)]
pub struct TokenCache {
    session: Option<TokenSession>,
    expires_at: DateTime<Utc>,
}

impl Default for TokenCache {
    fn default() -> Self {
        Self {
            session: None,
            expires_at: DateTime::<Utc>::MIN_UTC,
        }
    }
}

impl TokenCache {
    /// Caches a session issued at `issued_at`.
    pub fn issued(session: TokenSession, issued_at: DateTime<Utc>) -> Self {
        let expires_at = TimeDelta::try_seconds(session.expires_in)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            session: Some(session),
            expires_at,
        }
    }

    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.session.is_some() && now < self.expires_at
    }

    /// The access token, if it is still valid at `now`.
    pub fn access_token_at(&self, now: DateTime<Utc>) -> Option<&str> {
        self.session
            .as_ref()
            .filter(|_| self.is_valid_at(now))
            .map(|session| session.access_token.as_str())
    }
}

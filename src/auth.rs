//! Credentials and authentication tokens for the Salt API.

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Supported Salt API authentication schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// Username/password pair; the secret is sent under `password`.
    Basic,
    /// Service-account token; the secret is sent under `token`.
    BearerToken,
}

impl CredentialKind {
    /// Wire name of the scheme, used in log fields and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::Basic => "basic",
            CredentialKind::BearerToken => "bearer",
        }
    }
}

impl FromStr for CredentialKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "basic" => Ok(CredentialKind::Basic),
            "bearer" => Ok(CredentialKind::BearerToken),
            other => Err(Error::InvalidCredentialKind {
                kind: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity and secret used to authenticate against the Salt API.
///
/// Immutable after construction. Constructed once per logical session and
/// held for the session's duration.
#[derive(Clone)]
pub struct Credential {
    username: String,
    secret: String,
    kind: CredentialKind,
}

impl Credential {
    /// Build a credential, validating the kind string.
    ///
    /// Fails with [`Error::InvalidCredentialKind`] for anything other than
    /// `"basic"` or `"bearer"`.
    pub fn new(
        username: impl Into<String>,
        secret: impl Into<String>,
        kind: &str,
    ) -> Result<Self> {
        Ok(Self {
            username: username.into(),
            secret: secret.into(),
            kind: kind.parse()?,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn secret(&self) -> &str {
        &self.secret
    }

    pub fn kind(&self) -> CredentialKind {
        self.kind
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .field("kind", &self.kind)
            .finish()
    }
}

/// An authentication token returned by `POST /login`.
///
/// Immutable value; the client replaces its stored token wholesale on
/// (re)authentication. An absent token (never authenticated yet) is
/// represented as `None` at the client level, distinct from an expired one.
#[derive(Debug, Clone)]
pub struct Token {
    value: String,
    expires_at: SystemTime,
}

impl Token {
    /// Build a token from the `expire` field of the login response, a float
    /// UNIX epoch in seconds. Non-finite or non-positive epochs produce an
    /// already-expired token.
    pub(crate) fn from_epoch(value: String, expire: f64) -> Self {
        let expires_at = if expire.is_finite() && expire > 0.0 {
            UNIX_EPOCH + Duration::from_secs_f64(expire)
        } else {
            UNIX_EPOCH
        };
        Self { value, expires_at }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Pure expiry predicate against an explicit clock reading.
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(SystemTime::now())
    }
}

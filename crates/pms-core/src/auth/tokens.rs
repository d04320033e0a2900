//! Token pair, login credentials and the identity decoded from an access token.
//!
//! Access tokens are JWTs issued by the backend. The client never verifies
//! signatures; it only reads the payload to learn who is logged in. The server
//! remains the authority on whether a token is still good.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::UserType;

/// Display name used for the unauthenticated placeholder identity.
pub const GUEST_USERNAME: &str = "guest";

/// Email + password, used only for the login request.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Access + refresh bearer strings as returned by the token endpoints.
///
/// This is also the exact shape of the persisted record.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access.is_empty() && self.refresh.is_empty()
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &format_args!("<{} bytes>", self.access.len()))
            .field("refresh", &format_args!("<{} bytes>", self.refresh.len()))
            .finish()
    }
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("token is not a three-part JWT")]
    Malformed,

    #[error("token payload is not valid base64url: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("token payload has missing or invalid claims: {0}")]
    Claims(#[from] serde_json::Error),
}

/// Claims carried in the access token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub user_type: UserType,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    /// Expiry as unix seconds
    #[serde(default)]
    pub exp: Option<i64>,
}

impl Claims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at().map(|at| Utc::now() >= at).unwrap_or(false)
    }

    pub fn full_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("");
        let last = self.last_name.as_deref().unwrap_or("");
        format!("{} {}", first, last).trim().to_string()
    }
}

/// Read the claims out of a JWT without verifying it.
pub fn decode_claims(access: &str) -> Result<Claims, TokenError> {
    let mut segments = access.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_header), Some(payload), Some(_signature), None) if !payload.is_empty() => payload,
        _ => return Err(TokenError::Malformed),
    };

    // Some issuers pad the segments even though RFC 7515 says not to.
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Who the session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Identity {
    #[default]
    Guest,
    User(Claims),
}

impl Identity {
    pub fn from_access(access: &str) -> Result<Self, TokenError> {
        decode_claims(access).map(Identity::User)
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Identity::Guest)
    }

    pub fn claims(&self) -> Option<&Claims> {
        match self {
            Identity::Guest => None,
            Identity::User(claims) => Some(claims),
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.claims().map(|c| c.user_id)
    }

    pub fn user_type(&self) -> Option<UserType> {
        self.claims().map(|c| c.user_type)
    }

    /// Explicit username claim, falling back to the email the account logs in with.
    pub fn username(&self) -> &str {
        match self {
            Identity::Guest => GUEST_USERNAME,
            Identity::User(claims) => claims.username.as_deref().unwrap_or(&claims.email),
        }
    }
}

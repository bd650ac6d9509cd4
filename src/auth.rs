//! HTTP Basic authentication for profile writes.
//!
//! The admin username and password are resolved from configuration (see
//! [`crate::config::AuthConfig::credentials`]). Supplied credentials are
//! compared through HMAC-SHA256 tags with [`Mac::verify_slice`], so timing
//! does not depend on how many leading bytes match.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header, request::Parts};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

use crate::config::Credentials;
use crate::error::Error;

type HmacSha256 = Hmac<Sha256>;

const TAG_KEY: &[u8] = b"portfolio-api/basic-auth";

/// Holds MAC tags of the expected credentials, never the plaintext.
pub struct AuthGate {
    username_tag: Vec<u8>,
    password_tag: Vec<u8>,
}

impl AuthGate {
    pub fn new(credentials: &Credentials) -> Self {
        Self {
            username_tag: tag(credentials.username.as_bytes()),
            password_tag: tag(credentials.password.as_bytes()),
        }
    }

    /// Check a raw `Authorization` header value.
    pub fn check_header(&self, value: Option<&str>) -> Result<(), Error> {
        let value = value.ok_or(Error::Unauthorized)?;
        let (username, password) = parse_basic(value).map_err(|reason| {
            tracing::warn!("Failed to parse Authorization header: {}", reason);
            Error::Unauthorized
        })?;

        if self.verify(&username, &password) {
            Ok(())
        } else {
            Err(Error::Unauthorized)
        }
    }

    /// Compare both fields; both are always checked.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let user_ok = matches(&self.username_tag, username.as_bytes());
        let pass_ok = matches(&self.password_tag, password.as_bytes());
        user_ok & pass_ok
    }
}

fn mac() -> HmacSha256 {
    HmacSha256::new_from_slice(TAG_KEY).expect("HMAC can take key of any size")
}

fn tag(data: &[u8]) -> Vec<u8> {
    let mut mac = mac();
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn matches(expected_tag: &[u8], supplied: &[u8]) -> bool {
    let mut mac = mac();
    mac.update(supplied);
    mac.verify_slice(expected_tag).is_ok()
}

/// Split `Basic <base64(user:pass)>` into its two parts.
fn parse_basic(value: &str) -> Result<(String, String), &'static str> {
    let (scheme, encoded) = value
        .trim()
        .split_once(' ')
        .ok_or("missing credentials")?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err("unsupported scheme");
    }
    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| "invalid base64")?;
    let decoded = String::from_utf8(decoded).map_err(|_| "credentials are not UTF-8")?;
    let (username, password) = decoded.split_once(':').ok_or("missing ':' separator")?;
    Ok((username.to_string(), password.to_string()))
}

/// Extractor that admits only requests carrying the admin credentials.
///
/// Rejects with [`Error::Unauthorized`], which renders as 401 with a
/// `WWW-Authenticate: Basic` challenge.
pub struct AdminAuth;

impl<S> FromRequestParts<S> for AdminAuth
where
    Arc<AuthGate>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let gate = Arc::<AuthGate>::from_ref(state);
        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        gate.check_header(value).inspect_err(|_| {
            tracing::warn!(path = %parts.uri.path(), "Unauthorized access attempt");
        })?;

        Ok(AdminAuth)
    }
}

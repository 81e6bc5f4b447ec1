//! HTTP Basic auth gate.
//!
//! - Expected credentials come from [`AuthConfig`], fixed at startup
//! - When both configured username and password are empty, auth is disabled
//!   and every request passes, whatever it presents
//! - Otherwise every request needs `Authorization: Basic <base64(user:pass)>`
//!
//! # Security notes
//! - Every denial produces the same 401 body; the caller cannot tell a wrong
//!   username from a wrong password or a missing header.
//! - Both fields are always compared, in constant time per field.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::sync::Arc;

use super::routes::AppState;
use crate::config::AuthConfig;
use crate::error::ApiError;

const REALM: &str = r#"Basic realm="receptor""#;

/// Outcome of checking one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    Allow,
    Deny(DenyReason),
}

/// Why a request was denied. Only ever logged, never sent to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    MissingCredentials,
    MalformedCredentials,
    WrongCredentials,
}

/// Compares presented credentials against the configured pair.
#[derive(Clone)]
pub struct AuthGate {
    expected: AuthConfig,
}

impl AuthGate {
    pub fn new(expected: &AuthConfig) -> Self {
        Self {
            expected: expected.clone(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.expected.is_enabled()
    }

    /// Decide on a raw `Authorization` header value, if any.
    pub fn check(&self, authorization: Option<&str>) -> AuthDecision {
        if !self.is_enabled() {
            return AuthDecision::Allow;
        }

        let Some(authorization) = authorization.filter(|h| !h.trim().is_empty()) else {
            return AuthDecision::Deny(DenyReason::MissingCredentials);
        };

        let Some((username, password)) = parse_basic(authorization) else {
            return AuthDecision::Deny(DenyReason::MalformedCredentials);
        };

        // Evaluate both before combining so timing does not depend on which
        // field matched.
        let username_ok = constant_time_eq(&username, &self.expected.username);
        let password_ok = constant_time_eq(&password, &self.expected.password);
        if username_ok & password_ok {
            AuthDecision::Allow
        } else {
            AuthDecision::Deny(DenyReason::WrongCredentials)
        }
    }
}

/// Split a `Basic` header into username and password.
fn parse_basic(header_value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();
    let len = a_bytes.len().max(b_bytes.len());
    let mut diff: u8 = (a_bytes.len() != b_bytes.len()) as u8;
    for i in 0..len {
        let x = a_bytes.get(i).copied().unwrap_or(0);
        let y = b_bytes.get(i).copied().unwrap_or(0);
        diff |= x ^ y;
    }
    diff == 0
}

/// The single response used for every denial.
pub fn unauthorized_response() -> Response {
    let mut response = ApiError::unauthorized().into_response();
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(REALM));
    response
}

/// Middleware: runs before routing so nothing downstream, including the
/// not-found fallback, is reachable without credentials.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match state.auth.check(authorization) {
        AuthDecision::Allow => next.run(req).await,
        AuthDecision::Deny(reason) => {
            tracing::debug!(
                "Denied {} {}: {:?}",
                req.method(),
                req.uri().path(),
                reason
            );
            unauthorized_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(user: &str, pass: &str) -> String {
        format!("Basic {}", BASE64.encode(format!("{}:{}", user, pass)))
    }

    #[test]
    fn test_disabled_gate_allows_everything() {
        let gate = AuthGate::new(&AuthConfig::new("", ""));
        assert!(!gate.is_enabled());
        assert_eq!(gate.check(None), AuthDecision::Allow);
        assert_eq!(gate.check(Some("garbage")), AuthDecision::Allow);
        assert_eq!(gate.check(Some(&basic("x", "y"))), AuthDecision::Allow);
    }

    #[test]
    fn test_enabled_gate() {
        let gate = AuthGate::new(&AuthConfig::new("username", "password"));

        assert_eq!(gate.check(Some(&basic("username", "password"))), AuthDecision::Allow);
        assert_eq!(
            gate.check(None),
            AuthDecision::Deny(DenyReason::MissingCredentials)
        );
        assert_eq!(
            gate.check(Some("Bearer abc")),
            AuthDecision::Deny(DenyReason::MalformedCredentials)
        );
        assert_eq!(
            gate.check(Some("Basic !!!")),
            AuthDecision::Deny(DenyReason::MalformedCredentials)
        );
        assert_eq!(
            gate.check(Some(&basic("username", "wrong"))),
            AuthDecision::Deny(DenyReason::WrongCredentials)
        );
        assert_eq!(
            gate.check(Some(&basic("wrong", "password"))),
            AuthDecision::Deny(DenyReason::WrongCredentials)
        );
    }

    #[test]
    fn test_password_may_contain_colons() {
        let gate = AuthGate::new(&AuthConfig::new("user", "pa:ss"));
        assert_eq!(gate.check(Some(&basic("user", "pa:ss"))), AuthDecision::Allow);
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let gate = AuthGate::new(&AuthConfig::new("user", "pass"));
        let header = basic("user", "pass").replacen("Basic", "basic", 1);
        assert_eq!(gate.check(Some(&header)), AuthDecision::Allow);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("secret", "secret"));
        assert!(!constant_time_eq("secret", "secreT"));
        assert!(!constant_time_eq("secret", "secret2"));
        assert!(!constant_time_eq("", "x"));
        assert!(constant_time_eq("", ""));
    }

    #[test]
    fn test_unauthorized_response_has_challenge() {
        let response = unauthorized_response();
        assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            REALM
        );
    }
}

//! Anti-forgery (CSRF) tokens
//!
//! Stateless double-submit cookie tokens. The token is handed out both in the
//! response body and in the `csrf-token` cookie; a state-changing request must
//! send it back in the `X-CSRF-Token` header together with the cookie.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::{header, HeaderMap};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use upform_core::{AntiforgeryContext, AntiforgeryValidator};
use uuid::Uuid;

pub const CSRF_COOKIE_NAME: &str = "csrf-token";
pub const CSRF_HEADER_NAME: &str = "x-csrf-token";

type HmacSha256 = Hmac<Sha256>;

/// Issues and verifies tokens of the form `<hmac>.<timestamp>.<nonce>`
#[derive(Clone)]
pub struct CsrfTokens {
    secret: String,
    ttl_secs: u64,
}

impl std::fmt::Debug for CsrfTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfTokens")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl CsrfTokens {
    pub fn new(secret: impl Into<String>, ttl_secs: u64) -> Self {
        Self {
            secret: secret.into(),
            ttl_secs,
        }
    }

    pub fn generate(&self) -> String {
        self.generate_at(unix_now())
    }

    fn generate_at(&self, timestamp: u64) -> String {
        let nonce = Uuid::new_v4().simple().to_string();
        let message = format!("{}.{}", timestamp, nonce);
        format!("{}.{}", self.sign(&message), message)
    }

    /// Validates:
    /// 1. Token format (hmac.timestamp.nonce)
    /// 2. HMAC signature matches the secret
    /// 3. Token hasn't expired
    pub fn verify(&self, token: &str) -> bool {
        let mut parts = token.splitn(3, '.');
        let (Some(hmac_part), Some(timestamp_str), Some(nonce)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        if nonce.is_empty() || nonce.contains('.') {
            return false;
        }

        let Ok(timestamp) = timestamp_str.parse::<u64>() else {
            return false;
        };

        if timestamp.saturating_add(self.ttl_secs) < unix_now() {
            tracing::debug!("CSRF token expired");
            return false;
        }

        let expected = self.sign(&format!("{}.{}", timestamp, nonce));
        expected.as_bytes().ct_eq(hmac_part.as_bytes()).into()
    }

    /// `Set-Cookie` value carrying `token`
    pub fn cookie(&self, token: &str, secure: bool) -> String {
        let secure_flag = if secure { "; Secure" } else { "" };
        format!(
            "{}={}; Path=/; SameSite=Strict; HttpOnly{}",
            CSRF_COOKIE_NAME, token, secure_flag
        )
    }

    fn sign(&self, message: &str) -> String {
        // HMAC takes keys of any size
        let mut mac = match HmacSha256::new_from_slice(self.secret.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return String::new(),
        };
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl AntiforgeryValidator for CsrfTokens {
    /// Header and cookie must both be present, equal, and carry a valid token
    fn is_request_valid(&self, context: &AntiforgeryContext) -> bool {
        match (&context.header_token, &context.cookie_token) {
            (Some(header), Some(cookie)) => {
                bool::from(header.as_bytes().ct_eq(cookie.as_bytes())) && self.verify(header)
            }
            _ => false,
        }
    }
}

/// Collect the header and cookie tokens presented with a request
pub fn context_from_headers(headers: &HeaderMap) -> AntiforgeryContext {
    let header_token = headers
        .get(CSRF_HEADER_NAME)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let cookie_token = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == CSRF_COOKIE_NAME).then(|| value.trim().to_string())
        })
        .filter(|s| !s.is_empty());

    AntiforgeryContext {
        header_token,
        cookie_token,
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn tokens() -> CsrfTokens {
        CsrfTokens::new("test-secret", 3600)
    }

    #[test]
    fn test_generate_token_format() {
        let token = tokens().generate();
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        // Hex-encoded SHA-256
        assert_eq!(parts[0].len(), 64);
        assert!(parts[1].parse::<u64>().unwrap() > 0);
    }

    #[test]
    fn test_verify_roundtrip_and_wrong_secret() {
        let token = tokens().generate();
        assert!(tokens().verify(&token));
        assert!(!CsrfTokens::new("different-secret", 3600).verify(&token));
    }

    #[test]
    fn test_verify_invalid_format() {
        assert!(!tokens().verify("abc.123"));
        assert!(!tokens().verify("invalid"));
        assert!(!tokens().verify(""));
        assert!(!tokens().verify("abc.notanumber.nonce"));
    }

    #[test]
    fn test_verify_expired() {
        let stale = tokens().generate_at(unix_now() - 3600 - 1);
        assert!(!tokens().verify(&stale));
    }

    #[test]
    fn test_tampered_nonce_rejected() {
        let token = tokens().generate();
        let tampered = format!("{}x", token);
        assert!(!tokens().verify(&tampered));
    }

    #[test]
    fn test_double_submit_validation() {
        let csrf = tokens();
        let token = csrf.generate();

        let valid = AntiforgeryContext {
            header_token: Some(token.clone()),
            cookie_token: Some(token.clone()),
        };
        assert!(csrf.is_request_valid(&valid));

        let mismatched = AntiforgeryContext {
            header_token: Some(token.clone()),
            cookie_token: Some(csrf.generate()),
        };
        assert!(!csrf.is_request_valid(&mismatched));

        let header_only = AntiforgeryContext {
            header_token: Some(token),
            cookie_token: None,
        };
        assert!(!csrf.is_request_valid(&header_only));
    }

    #[test]
    fn test_context_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(CSRF_HEADER_NAME, HeaderValue::from_static("abc.1.n"));
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; csrf-token=abc.1.n; other=x"),
        );

        let context = context_from_headers(&headers);
        assert_eq!(context.header_token.as_deref(), Some("abc.1.n"));
        assert_eq!(context.cookie_token.as_deref(), Some("abc.1.n"));

        assert_eq!(context_from_headers(&HeaderMap::new()), AntiforgeryContext::default());
    }

    #[test]
    fn test_cookie_flags() {
        let csrf = tokens();
        assert_eq!(
            csrf.cookie("t", false),
            "csrf-token=t; Path=/; SameSite=Strict; HttpOnly"
        );
        assert!(csrf.cookie("t", true).ends_with("; Secure"));
    }
}

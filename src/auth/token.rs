//! Signed-token issuance and verification.
//!
//! Compact HS256 tokens (header.claims.signature, base64url without
//! padding) with a fixed TTL. The secret is injected at construction time
//! and never read from process environment at call time. Verification
//! swallows every failure mode — malformed input, bad signature, expiry —
//! into `None` so call sites branch instead of handling errors.

use anyhow::Result;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use ring::hmac;
use serde_json::{Map, Value, json};

/// Default token lifetime: one hour.
pub const DEFAULT_TTL_SECS: i64 = 3600;

/// Issues and verifies HS256 tokens with a fixed lifetime.
pub struct TokenSigner {
    key: hmac::Key,
    ttl: Duration,
}

impl TokenSigner {
    /// Create a signer with the default one-hour TTL.
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, Duration::seconds(DEFAULT_TTL_SECS))
    }

    /// Create a signer with an explicit TTL.
    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes()),
            ttl,
        }
    }

    /// Sign `claims`, stamping `iat` and `exp`.
    ///
    /// Caller-provided `iat`/`exp` entries are overwritten; the lifetime is
    /// the signer's, not the caller's.
    pub fn sign(&self, claims: &Map<String, Value>) -> Result<String> {
        let now = Utc::now();
        let mut claims = claims.clone();
        claims.insert("iat".to_string(), json!(now.timestamp()));
        claims.insert("exp".to_string(), json!((now + self.ttl).timestamp()));

        let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&json!({
            "alg": "HS256",
            "typ": "JWT",
        }))?);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signing_input = format!("{header}.{payload}");
        let signature = URL_SAFE_NO_PAD.encode(hmac::sign(&self.key, signing_input.as_bytes()));

        Ok(format!("{signing_input}.{signature}"))
    }

    /// Verify `token`, returning its claims if the signature checks out and
    /// the token has not expired. Any failure yields `None`.
    pub fn verify(&self, token: &str) -> Option<Map<String, Value>> {
        let mut parts = token.split('.');
        let header = parts.next()?;
        let payload = parts.next()?;
        let signature = parts.next()?;
        if parts.next().is_some() {
            return None;
        }

        let signing_input = format!("{header}.{payload}");
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
        hmac::verify(&self.key, signing_input.as_bytes(), &signature).ok()?;

        let claims: Map<String, Value> =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).ok()?).ok()?;

        let exp = claims.get("exp")?.as_i64()?;
        if exp <= Utc::now().timestamp() {
            return None;
        }

        Some(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims() -> Map<String, Value> {
        let mut claims = Map::new();
        claims.insert("userId".to_string(), json!("abc"));
        claims
    }

    #[test]
    fn test_sign_verify_round_trip() {
        let signer = TokenSigner::new("test-secret");
        let token = signer.sign(&claims()).unwrap();
        let verified = signer.verify(&token).unwrap();
        assert_eq!(verified.get("userId"), Some(&json!("abc")));
        assert!(verified.contains_key("exp"));
        assert!(verified.contains_key("iat"));
    }

    #[test]
    fn test_expired_token_verifies_to_none() {
        let signer = TokenSigner::with_ttl("test-secret", Duration::seconds(-10));
        let token = signer.sign(&claims()).unwrap();
        assert!(signer.verify(&token).is_none());
    }

    #[test]
    fn test_tampered_signature_verifies_to_none() {
        let signer = TokenSigner::new("test-secret");
        let token = signer.sign(&claims()).unwrap();
        let mut tampered = token.clone();
        // Flip the last signature character.
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });
        assert!(signer.verify(&tampered).is_none());
    }

    #[test]
    fn test_wrong_secret_verifies_to_none() {
        let signer = TokenSigner::new("test-secret");
        let other = TokenSigner::new("other-secret");
        let token = signer.sign(&claims()).unwrap();
        assert!(other.verify(&token).is_none());
    }

    #[test]
    fn test_malformed_token_verifies_to_none() {
        let signer = TokenSigner::new("test-secret");
        assert!(signer.verify("not-a-token").is_none());
        assert!(signer.verify("a.b").is_none());
        assert!(signer.verify("a.b.c.d").is_none());
        assert!(signer.verify("").is_none());
    }
}

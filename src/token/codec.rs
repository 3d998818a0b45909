//! Compact signed-token codec (HS256).
//!
//! Tokens are the standard three-segment compact form:
//! `base64url(header).base64url(payload).base64url(hmac-sha256)`, no padding.
//! Validity is purely a function of the signature and a clock comparison;
//! tokens are never mutated after issuance.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Verification failure taxonomy. These distinctions exist for callers
/// inside the crate; the request adapter collapses all of them into a
/// single generic authentication failure before anything leaves the
/// process boundary.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    /// The token does not have the expected three-segment structure, or
    /// its payload is not valid JSON.
    #[error("malformed token")]
    Malformed,

    /// The signature segment does not match a recomputation over the
    /// header and payload segments.
    #[error("invalid token signature")]
    BadSignature,

    /// The token's expiry timestamp is in the past.
    #[error("token expired")]
    Expired,

    /// The token is valid but carries the wrong type tag for the
    /// verification path that received it.
    #[error("invalid token type")]
    WrongTokenType,
}

/// The class of a token.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived credential authorizing a single request's identity.
    Access,
    /// Long-lived credential intended to mint new access tokens.
    Refresh,
}

/// The signed payload of a token.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject: the user id, as a string.
    pub sub: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
    /// Token class tag. Checked on every verification path.
    #[serde(rename = "type")]
    pub token_type: TokenType,
}

#[derive(Serialize)]
struct Header {
    alg: &'static str,
    typ: &'static str,
}

const HEADER: Header = Header {
    alg: "HS256",
    typ: "JWT",
};

/// Stateless encode/verify over a server-held secret.
#[derive(Clone)]
pub struct TokenCodec {
    secret: Zeroizing<Vec<u8>>,
}

impl TokenCodec {
    /// Creates a codec around the signing secret.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            secret: Zeroizing::new(secret.to_vec()),
        }
    }

    /// Serializes and signs `claims` into the compact three-segment form.
    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        let header_json = sonic_rs::to_string(&HEADER).map_err(|_| TokenError::Malformed)?;
        let payload_json = sonic_rs::to_string(claims).map_err(|_| TokenError::Malformed)?;

        let data = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(payload_json)
        );
        let signature = URL_SAFE_NO_PAD.encode(self.sign(data.as_bytes()));

        Ok(format!("{}.{}", data, signature))
    }

    /// Verifies a compact token and returns its claims.
    ///
    /// Failure order: structure, then signature, then payload parse, then
    /// expiry. A structurally broken token is always `Malformed`, never a
    /// signature or expiry error.
    pub fn decode_and_verify(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(TokenError::Malformed);
        }

        let data = format!("{}.{}", parts[0], parts[1]);
        let expected = URL_SAFE_NO_PAD.encode(self.sign(data.as_bytes()));

        // Constant-time comparison; ct_eq rejects length mismatches.
        if !bool::from(expected.as_bytes().ct_eq(parts[2].as_bytes())) {
            return Err(TokenError::BadSignature);
        }

        let payload = URL_SAFE_NO_PAD
            .decode(parts[1])
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims =
            sonic_rs::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

        if claims.exp < now {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC-SHA256 accepts keys of any length");
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"unit-test-secret-0123456789abcdef";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET)
    }

    fn claims(now: i64) -> Claims {
        Claims {
            sub: "42".to_string(),
            iat: now,
            exp: now + 900,
            token_type: TokenType::Access,
        }
    }

    #[test]
    fn round_trip_preserves_claims() {
        let c = codec();
        let original = claims(1_000);
        let token = c.encode(&original).unwrap();
        let decoded = c.decode_and_verify(&token, 1_000).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn token_has_three_unpadded_segments() {
        let token = codec().encode(&claims(0)).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| !p.is_empty() && !p.contains('=')));
        // 32-byte MAC encodes to 43 base64url characters.
        assert_eq!(parts[2].len(), 43);
    }

    #[test]
    fn flipping_any_signature_character_fails_with_bad_signature() {
        let c = codec();
        let token = c.encode(&claims(1_000)).unwrap();
        let dot = token.rfind('.').unwrap();
        let (prefix, signature) = (&token[..=dot], &token[dot + 1..]);

        for (i, ch) in signature.char_indices() {
            let flipped = if ch == 'A' { 'B' } else { 'A' };
            if flipped == ch {
                continue;
            }
            let mut tampered = String::from(prefix);
            tampered.push_str(&signature[..i]);
            tampered.push(flipped);
            tampered.push_str(&signature[i + 1..]);
            assert_eq!(
                c.decode_and_verify(&tampered, 1_000),
                Err(TokenError::BadSignature),
                "flip at signature index {i}"
            );
        }
    }

    #[test]
    fn tampered_payload_fails_with_bad_signature() {
        let c = codec();
        let token = c.encode(&claims(1_000)).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let mut forged = claims(1_000);
        forged.sub = "1".to_string();
        let forged_payload =
            URL_SAFE_NO_PAD.encode(serde_json::to_string(&forged).unwrap());

        let tampered = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);
        assert_eq!(
            c.decode_and_verify(&tampered, 1_000),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn wrong_segment_count_is_malformed_never_signature_or_expiry() {
        let c = codec();
        for bad in ["", "abc", "a.b", "a.b.c.d", "....", "not a token"] {
            assert_eq!(
                c.decode_and_verify(bad, 1_000),
                Err(TokenError::Malformed),
                "input {bad:?}"
            );
        }
    }

    #[test]
    fn empty_segment_is_malformed() {
        let c = codec();
        for bad in ["..sig", "a..c", "a.b.", ".b.c"] {
            assert_eq!(c.decode_and_verify(bad, 1_000), Err(TokenError::Malformed));
        }
    }

    #[test]
    fn correctly_signed_garbage_payload_is_malformed() {
        let c = codec();
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode("this is not json");
        let data = format!("{}.{}", header, payload);
        let signature = URL_SAFE_NO_PAD.encode(c.sign(data.as_bytes()));
        let token = format!("{}.{}", data, signature);
        assert_eq!(c.decode_and_verify(&token, 1_000), Err(TokenError::Malformed));
    }

    #[test]
    fn expired_token_fails_regardless_of_valid_signature() {
        let c = codec();
        let token = c.encode(&claims(1_000)).unwrap();
        assert_eq!(
            c.decode_and_verify(&token, 2_000),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn signature_is_checked_before_expiry() {
        let c = codec();
        let token = c.encode(&claims(1_000)).unwrap();
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });
        // Expired AND tampered: the signature error wins.
        assert_eq!(
            c.decode_and_verify(&tampered, 10_000),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn token_accepted_at_exact_expiry_instant() {
        let c = codec();
        let token = c.encode(&claims(1_000)).unwrap();
        let decoded = c.decode_and_verify(&token, 1_900).unwrap();
        assert_eq!(decoded.sub, "42");
    }

    #[test]
    fn different_secret_rejects_signature() {
        let token = codec().encode(&claims(1_000)).unwrap();
        let other = TokenCodec::new(b"another-secret-another-secret-xx");
        assert_eq!(
            other.decode_and_verify(&token, 1_000),
            Err(TokenError::BadSignature)
        );
    }
}

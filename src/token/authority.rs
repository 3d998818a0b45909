//! Token issuance and type-checked verification.
//!
//! Issuance is a pure function of (user id, current time, secret); the
//! session-record side effect happens one layer up, at login time.

use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use super::codec::{Claims, TokenCodec, TokenError, TokenType};

/// Access tokens expire 15 minutes after issuance.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;
/// Refresh tokens (and their session records) expire after 30 days.
pub const REFRESH_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

const OPAQUE_TOKEN_SIZE: usize = 32;

/// Issues, signs, and verifies the two bearer token classes.
///
/// The signing secret is injected once at construction; the authority holds
/// no other state and performs no I/O.
#[derive(Clone)]
pub struct TokenAuthority {
    codec: TokenCodec,
}

impl TokenAuthority {
    /// Creates an authority around the server signing secret.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            codec: TokenCodec::new(secret),
        }
    }

    /// Mints a short-lived access token for `user_id`.
    pub fn issue_access(&self, user_id: &str) -> Result<String, TokenError> {
        self.issue_access_at(user_id, Utc::now().timestamp())
    }

    /// Mints an access token with an explicit clock, for deterministic use.
    pub fn issue_access_at(&self, user_id: &str, now: i64) -> Result<String, TokenError> {
        self.codec.encode(&Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + ACCESS_TOKEN_TTL_SECS,
            token_type: TokenType::Access,
        })
    }

    /// Mints a long-lived refresh token for `user_id`.
    pub fn issue_refresh(&self, user_id: &str) -> Result<String, TokenError> {
        self.issue_refresh_at(user_id, Utc::now().timestamp())
    }

    /// Mints a refresh token with an explicit clock, for deterministic use.
    pub fn issue_refresh_at(&self, user_id: &str, now: i64) -> Result<String, TokenError> {
        self.codec.encode(&Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + REFRESH_TOKEN_TTL_SECS,
            token_type: TokenType::Refresh,
        })
    }

    /// Verifies a token and asserts it is an access token.
    ///
    /// A refresh token presented here is rejected with `WrongTokenType`;
    /// the type tag is the only defense against token confusion and is
    /// checked on every verification path.
    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_access_at(token, Utc::now().timestamp())
    }

    /// `verify_access` with an explicit clock.
    pub fn verify_access_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let claims = self.codec.decode_and_verify(token, now)?;
        if claims.token_type != TokenType::Access {
            return Err(TokenError::WrongTokenType);
        }
        Ok(claims)
    }

    /// Verifies a token and asserts it is a refresh token.
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_refresh_at(token, Utc::now().timestamp())
    }

    /// `verify_refresh` with an explicit clock.
    pub fn verify_refresh_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let claims = self.codec.decode_and_verify(token, now)?;
        if claims.token_type != TokenType::Refresh {
            return Err(TokenError::WrongTokenType);
        }
        Ok(claims)
    }
}

/// One-way hash of a token for at-rest storage. The raw token is never
/// persisted; only this hash is.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Generates an opaque, collision-resistant token (email verification,
/// per-login client ids are uuids instead).
pub fn generate_secure_token() -> String {
    let mut bytes = [0u8; OPAQUE_TOKEN_SIZE];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authority() -> TokenAuthority {
        TokenAuthority::new(b"unit-test-secret-0123456789abcdef")
    }

    #[test]
    fn access_token_valid_within_fifteen_minutes() {
        let auth = authority();
        let token = auth.issue_access_at("42", 0).unwrap();

        let claims = auth.verify_access_at(&token, 600).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.iat, 0);
        assert_eq!(claims.exp, ACCESS_TOKEN_TTL_SECS);
    }

    #[test]
    fn access_token_expired_after_fifteen_minutes() {
        let auth = authority();
        let token = auth.issue_access_at("42", 0).unwrap();
        assert_eq!(auth.verify_access_at(&token, 1_000), Err(TokenError::Expired));
    }

    #[test]
    fn refresh_token_rejected_by_access_verification() {
        let auth = authority();
        let token = auth.issue_refresh_at("7", 0).unwrap();
        assert_eq!(
            auth.verify_access_at(&token, 10),
            Err(TokenError::WrongTokenType)
        );
    }

    #[test]
    fn access_token_rejected_by_refresh_verification() {
        let auth = authority();
        let token = auth.issue_access_at("7", 0).unwrap();
        assert_eq!(
            auth.verify_refresh_at(&token, 10),
            Err(TokenError::WrongTokenType)
        );
    }

    #[test]
    fn refresh_token_carries_thirty_day_expiry() {
        let auth = authority();
        let token = auth.issue_refresh_at("7", 100).unwrap();
        let claims = auth.verify_refresh_at(&token, 100).unwrap();
        assert_eq!(claims.exp - claims.iat, REFRESH_TOKEN_TTL_SECS);
    }

    #[test]
    fn wall_clock_issue_and_verify_round_trip() {
        let auth = authority();

        let access = auth.issue_access("42").unwrap();
        assert_eq!(auth.verify_access(&access).unwrap().sub, "42");
        assert_eq!(auth.verify_refresh(&access), Err(TokenError::WrongTokenType));

        let refresh = auth.issue_refresh("42").unwrap();
        assert_eq!(auth.verify_refresh(&refresh).unwrap().sub, "42");
        assert_eq!(auth.verify_access(&refresh), Err(TokenError::WrongTokenType));
    }

    #[test]
    fn hash_token_is_stable_hex_sha256() {
        let a = hash_token("some-token");
        let b = hash_token("some-token");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, hash_token("other-token"));
    }

    #[test]
    fn secure_tokens_are_unique_and_hex() {
        let a = generate_secure_token();
        let b = generate_secure_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), OPAQUE_TOKEN_SIZE * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Server-side proof that a refresh token was issued.
///
/// Only a one-way hash of the refresh token is stored, never the raw token.
/// Records are append-only: one row per login, expiring in lockstep with
/// the refresh token they witness.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    /// The ID of the user this session belongs to.
    pub user_id: Uuid,
    /// Opaque identifier generated per login.
    pub client_id: Uuid,
    /// SHA-256 hex hash of the refresh token.
    pub refresh_token_hash: String,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the session expires.
    pub expires_at: DateTime<Utc>,
}

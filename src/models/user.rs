use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Represents a user in the system.
#[derive(Debug, Clone)]
pub struct User {
    /// The unique identifier for the user.
    pub id: Uuid,
    /// The user's email address.
    pub email: String,
    /// The user's hashed password.
    pub password_hash: String,
    /// The user's display name.
    pub display_name: String,
    /// The user's username.
    pub username: String,
    /// The user's role (player or creator).
    pub role: String,
    /// When the user verified their email address, if they have.
    pub email_verified_at: Option<DateTime<Utc>>,
    /// The user's avatar URL.
    pub avatar_url: Option<String>,
    /// The timestamp when the user was created.
    pub created_at: DateTime<Utc>,
}

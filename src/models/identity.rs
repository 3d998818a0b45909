use serde::Serialize;
use uuid::Uuid;

use crate::models::user::User;

/// The per-request identity context.
///
/// Derived from a verified access token plus a user lookup; never
/// persisted, lives only for the duration of request handling.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// The authenticated user's id.
    pub user_id: Uuid,
    /// The user's email address.
    pub email: String,
    /// The user's display name.
    pub display_name: String,
    /// The user's username.
    pub username: String,
    /// The user's role.
    pub role: String,
    /// Whether the user has verified their email address.
    pub email_verified: bool,
    /// The user's avatar URL.
    pub avatar_url: Option<String>,
}

impl Identity {
    /// Builds the identity context from a user record.
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            username: user.username.clone(),
            role: user.role.clone(),
            email_verified: user.email_verified_at.is_some(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

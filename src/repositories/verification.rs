use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use uuid::Uuid;
use crate::error::Result;

/// An email verification token row, looked up by the hash of the opaque
/// token the user received by mail.
#[derive(Debug)]
pub struct VerificationToken {
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

/// Stores the hash of a newly minted verification token.
pub async fn insert(
    pool: &Pool,
    user_id: &Uuid,
    token_hash: &str,
    expires_at: &DateTime<Utc>,
) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            r#"
            INSERT INTO email_verification_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            "#,
            &[user_id, &token_hash, expires_at],
        )
        .await?;
    Ok(())
}

/// Finds a verification token by its hash.
pub async fn find_by_hash(pool: &Pool, token_hash: &str) -> Result<Option<VerificationToken>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT user_id, expires_at, used_at
            FROM email_verification_tokens
            WHERE token_hash = $1
            "#,
            &[&token_hash],
        )
        .await?;
    Ok(row
        .map(|r| -> Result<VerificationToken> {
            Ok(VerificationToken {
                user_id: r.try_get("user_id")?,
                expires_at: r.try_get("expires_at")?,
                used_at: r.try_get("used_at")?,
            })
        })
        .transpose()?)
}

/// Marks a verification token as consumed.
pub async fn mark_used(pool: &Pool, token_hash: &str) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            r#"
            UPDATE email_verification_tokens
            SET used_at = NOW()
            WHERE token_hash = $1
            "#,
            &[&token_hash],
        )
        .await?;
    Ok(())
}

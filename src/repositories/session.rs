use deadpool_postgres::Pool;
use crate::{error::Result, models::session::SessionRecord};

/// Persists a session record for a freshly issued refresh token.
///
/// Append-only: records are never updated, and no verification path reads
/// them back yet; token verification goes by signature and expiry alone.
pub async fn insert_session(pool: &Pool, record: &SessionRecord) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            r#"
            INSERT INTO sessions (user_id, client_id, refresh_token_hash, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
            &[
                &record.user_id,
                &record.client_id,
                &record.refresh_token_hash,
                &record.created_at,
                &record.expires_at,
            ],
        )
        .await?;
    Ok(())
}

use deadpool_postgres::Pool;
use tokio_postgres::Row;
use uuid::Uuid;
use crate::{error::Result, models::user::User};

/// A helper function to map a `tokio_postgres::Row` to a `User`.
fn row_to_user(row: &Row) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        display_name: row.try_get("display_name")?,
        username: row.try_get("username")?,
        role: row.try_get("role")?,
        email_verified_at: row.try_get("email_verified_at")?,
        avatar_url: row.try_get("avatar_url")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Creates a new user in the database.
pub async fn insert(
    pool: &Pool,
    id: Uuid,
    email: &str,
    password_hash: &str,
    display_name: &str,
    username: &str,
) -> Result<User> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            r#"
            INSERT INTO users (id, email, password_hash, display_name, username)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
            &[&id, &email, &password_hash, &display_name, &username],
        )
        .await?;
    row_to_user(&row)
}

/// Finds a user by their email address.
pub async fn find_by_email(pool: &Pool, email: &str) -> Result<Option<User>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT *
            FROM users
            WHERE email = $1
            "#,
            &[&email],
        )
        .await?;
    row.map(|r| row_to_user(&r)).transpose()
}

/// Finds a user by their ID.
pub async fn find_by_id(pool: &Pool, user_id: &Uuid) -> Result<Option<User>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT *
            FROM users
            WHERE id = $1
            "#,
            &[user_id],
        )
        .await?;
    row.map(|r| row_to_user(&r)).transpose()
}

/// Checks whether an email or username is already taken.
pub async fn email_or_username_exists(pool: &Pool, email: &str, username: &str) -> Result<bool> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT id
            FROM users
            WHERE email = $1 OR username = $2
            "#,
            &[&email, &username],
        )
        .await?;
    Ok(row.is_some())
}

/// Stamps the user's email as verified.
pub async fn mark_email_verified(pool: &Pool, user_id: &Uuid) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            r#"
            UPDATE users
            SET email_verified_at = NOW()
            WHERE id = $1
            "#,
            &[user_id],
        )
        .await?;
    Ok(())
}
